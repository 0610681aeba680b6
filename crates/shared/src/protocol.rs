use serde::{Deserialize, Serialize};

use crate::domain::DocumentKind;

/// Routes exposed by the conversion/suggestion service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Upload,
    ContentSuggest,
    ConvertPdf,
    ConvertPptx,
    LessonPlan,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::ContentSuggest => "content-suggest",
            Self::ConvertPdf => "convert-pdf",
            Self::ConvertPptx => "convert-pptx",
            Self::LessonPlan => "lesson-plan",
        }
    }

    pub fn convert_for(kind: DocumentKind) -> Self {
        match kind {
            DocumentKind::Pdf => Self::ConvertPdf,
            DocumentKind::Pptx => Self::ConvertPptx,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentSuggestRequest {
    pub filename: String,
    pub subject: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentSuggestResponse {
    pub suggestion: String,
}

/// Conversion responses are kept loose so a missing `slides` array can be
/// reported as a format error instead of a generic JSON failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConvertResponse {
    #[serde(default)]
    pub slides: Option<serde_json::Value>,
}

impl ConvertResponse {
    pub fn slide_urls(self) -> Option<Vec<String>> {
        serde_json::from_value(self.slides?).ok()
    }
}
