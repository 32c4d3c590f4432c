//! HTTP surface for the formatshift conversion workflow.
//!
//! The binary in `main.rs` wires configuration, stores and the converter into
//! an [`AppState`](state::AppState) and serves [`api::create_router`].

pub mod api;
pub mod metrics;
pub mod state;
