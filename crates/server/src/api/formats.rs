//! Format catalog handlers.

use axum::{extract::Path, http::StatusCode, Json};
use formatshift_core::{catalog, formats_for, Category, FormatLabel};
use serde::Serialize;

use super::handlers::{error_response, ErrorResponse};

/// Target formats offered for one category
#[derive(Debug, Serialize)]
pub struct CategoryFormats {
    pub category: Category,
    pub formats: Vec<FormatLabel>,
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub categories: Vec<CategoryFormats>,
}

/// The whole catalog, in display order
pub async fn list_formats() -> Json<CatalogResponse> {
    let categories = catalog()
        .into_iter()
        .map(|(category, formats)| CategoryFormats {
            category,
            formats: formats.to_vec(),
        })
        .collect();
    Json(CatalogResponse { categories })
}

/// Formats for a single category
pub async fn get_category_formats(
    Path(category): Path<String>,
) -> Result<Json<CategoryFormats>, (StatusCode, Json<ErrorResponse>)> {
    let category: Category = category
        .parse()
        .map_err(|e: formatshift_core::UnknownCategory| {
            error_response(StatusCode::NOT_FOUND, e.to_string())
        })?;

    Ok(Json(CategoryFormats {
        category,
        formats: formats_for(category).to_vec(),
    }))
}
