use std::path::Path;

use serde::{Deserialize, Serialize};

/// One piece of guidance attached to a slide.
///
/// `link` is always present on the wire; an empty string means "no source".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub content: String,
    pub link: String,
}

impl Suggestion {
    pub fn has_link(&self) -> bool {
        !self.link.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideSuggestionGroup {
    pub slide: u32,
    pub suggestions: Vec<Suggestion>,
}

pub type DecodedSuggestions = Vec<SlideSuggestionGroup>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Pdf,
    Pptx,
}

impl DocumentKind {
    /// Anything that is not a `.pdf` goes through the presentation converter.
    pub fn from_filename(filename: &str) -> Self {
        let is_pdf = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf {
            Self::Pdf
        } else {
            Self::Pptx
        }
    }

    pub fn page_label(self) -> &'static str {
        match self {
            Self::Pdf => "Page",
            Self::Pptx => "Slide",
        }
    }
}
