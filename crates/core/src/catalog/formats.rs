//! Static table of target formats per category.

use super::types::{Category, FormatLabel};

const DOCUMENT_FORMATS: &[FormatLabel] = &[
    FormatLabel("PDF"),
    FormatLabel("DOCX"),
    FormatLabel("TXT"),
    FormatLabel("RTF"),
    FormatLabel("ODT"),
];

const IMAGE_FORMATS: &[FormatLabel] = &[
    FormatLabel("JPG"),
    FormatLabel("PNG"),
    FormatLabel("GIF"),
    FormatLabel("WEBP"),
    FormatLabel("SVG"),
];

const AUDIO_FORMATS: &[FormatLabel] = &[
    FormatLabel("MP3"),
    FormatLabel("WAV"),
    FormatLabel("OGG"),
    FormatLabel("FLAC"),
    FormatLabel("AAC"),
];

const VIDEO_FORMATS: &[FormatLabel] = &[
    FormatLabel("MP4"),
    FormatLabel("AVI"),
    FormatLabel("MOV"),
    FormatLabel("MKV"),
    FormatLabel("WEBM"),
];

/// Returns the target formats offered for a category, in display order.
pub fn formats_for(category: Category) -> &'static [FormatLabel] {
    match category {
        Category::Document => DOCUMENT_FORMATS,
        Category::Image => IMAGE_FORMATS,
        Category::Audio => AUDIO_FORMATS,
        Category::Video => VIDEO_FORMATS,
    }
}

/// The whole catalog, one entry per category.
pub fn catalog() -> Vec<(Category, &'static [FormatLabel])> {
    Category::all()
        .into_iter()
        .map(|c| (c, formats_for(c)))
        .collect()
}

impl Category {
    /// Target formats offered for this category.
    pub fn formats(&self) -> &'static [FormatLabel] {
        formats_for(*self)
    }

    /// Looks up a target label for this category, ignoring ASCII case.
    ///
    /// Returns `None` when the label is not offered for the category.
    pub fn target(&self, label: &str) -> Option<FormatLabel> {
        let label = label.trim();
        self.formats()
            .iter()
            .copied()
            .find(|f| f.as_str().eq_ignore_ascii_case(label))
    }
}
