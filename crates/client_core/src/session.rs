//! Lesson-plan workflow state for a single view.
//!
//! A session owns one in-memory result slot. Requests are issued with
//! increasing [`RequestToken`]s and a completion is applied only when its
//! token is still the latest one for that slot; anything older is dropped.

use std::sync::Arc;

use serde_json::Value;
use shared::{
    align::suggestions_for,
    decode::decode,
    domain::{DecodedSuggestions, DocumentKind, SlideSuggestionGroup},
};
use tracing::{debug, info, warn};

use crate::{
    api::UpTeachApi,
    deck::SlideDeck,
    error::{ClientError, ValidationError},
    types::UploadedFile,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Current,
    Stale,
}

pub struct PendingConversion {
    pub token: RequestToken,
    pub file: UploadedFile,
    pub subject: String,
}

impl PendingConversion {
    pub async fn run(self, api: &dyn UpTeachApi) -> ConversionOutcome {
        let result = api.convert(&self.file, &self.subject).await;
        ConversionOutcome {
            token: self.token,
            kind: self.file.kind(),
            result,
        }
    }
}

pub struct ConversionOutcome {
    pub token: RequestToken,
    pub kind: DocumentKind,
    pub result: Result<Vec<String>, ClientError>,
}

pub struct PendingGeneration {
    pub token: RequestToken,
    pub file: UploadedFile,
    pub subject: String,
}

impl PendingGeneration {
    pub async fn run(self, api: &dyn UpTeachApi) -> GenerationOutcome {
        let result = api.lesson_plan(&self.file, &self.subject).await;
        GenerationOutcome {
            token: self.token,
            result,
        }
    }
}

pub struct GenerationOutcome {
    pub token: RequestToken,
    pub result: Result<Value, ClientError>,
}

pub struct LessonSession {
    api: Arc<dyn UpTeachApi>,
    subject: String,
    file: Option<UploadedFile>,
    deck: SlideDeck,
    suggestions: DecodedSuggestions,
    last_token: u64,
    latest_conversion: Option<RequestToken>,
    latest_generation: Option<RequestToken>,
}

impl LessonSession {
    pub fn new(api: Arc<dyn UpTeachApi>) -> Self {
        Self {
            api,
            subject: String::new(),
            file: None,
            deck: SlideDeck::default(),
            suggestions: Vec::new(),
            last_token: 0,
            latest_conversion: None,
            latest_generation: None,
        }
    }

    pub fn api(&self) -> Arc<dyn UpTeachApi> {
        Arc::clone(&self.api)
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn set_subject(&mut self, subject: impl Into<String>) {
        self.subject = subject.into();
    }

    pub fn file(&self) -> Option<&UploadedFile> {
        self.file.as_ref()
    }

    pub fn deck(&self) -> &SlideDeck {
        &self.deck
    }

    pub fn deck_mut(&mut self) -> &mut SlideDeck {
        &mut self.deck
    }

    pub fn suggestions(&self) -> &[SlideSuggestionGroup] {
        &self.suggestions
    }

    pub fn is_generating(&self) -> bool {
        self.latest_generation.is_some()
    }

    pub fn current_suggestions(&self) -> Vec<&SlideSuggestionGroup> {
        suggestions_for(self.deck.position(), &self.suggestions)
    }

    fn issue_token(&mut self) -> RequestToken {
        self.last_token += 1;
        RequestToken(self.last_token)
    }

    /// Replaces the selected file and discards everything derived from the
    /// previous one. The returned request renders the new file's pages.
    pub fn select_file(&mut self, file: UploadedFile) -> PendingConversion {
        let token = self.issue_token();
        info!(
            filename = %file.filename,
            kind = ?file.kind(),
            token = token.value(),
            "selected file"
        );
        self.file = Some(file.clone());
        self.deck = SlideDeck::default();
        self.suggestions.clear();
        self.latest_conversion = Some(token);
        self.latest_generation = None;
        PendingConversion {
            token,
            file,
            subject: self.subject.clone(),
        }
    }

    /// Reinstates a previously persisted selection without rendering pages.
    pub fn restore(&mut self, file: UploadedFile, subject: impl Into<String>) {
        self.remove_file();
        self.subject = subject.into();
        self.file = Some(file);
    }

    pub fn apply_conversion(&mut self, outcome: ConversionOutcome) -> Result<Applied, ClientError> {
        if self.latest_conversion != Some(outcome.token) {
            debug!(token = outcome.token.value(), "dropping stale conversion response");
            return Ok(Applied::Stale);
        }
        self.latest_conversion = None;

        match outcome.result {
            Ok(slides) => {
                info!(slides = slides.len(), "converted document");
                self.deck = SlideDeck::new(outcome.kind, slides);
                Ok(Applied::Current)
            }
            Err(err) => {
                warn!(error = %err, "document conversion failed");
                self.deck = SlideDeck::default();
                Err(err)
            }
        }
    }

    pub async fn open_file(&mut self, file: UploadedFile) -> Result<Applied, ClientError> {
        let pending = self.select_file(file);
        let outcome = pending.run(self.api.as_ref()).await;
        self.apply_conversion(outcome)
    }

    /// Checks the inputs and issues a suggestion request for the selected file.
    pub fn begin_generation(&mut self) -> Result<PendingGeneration, ClientError> {
        let file = self.file.clone().ok_or(ValidationError::MissingFile)?;
        if self.subject.trim().is_empty() {
            return Err(ValidationError::EmptySubject.into());
        }

        let token = self.issue_token();
        info!(
            filename = %file.filename,
            subject = %self.subject,
            token = token.value(),
            "requesting lesson plan suggestions"
        );
        self.latest_generation = Some(token);
        Ok(PendingGeneration {
            token,
            file,
            subject: self.subject.clone(),
        })
    }

    /// Decodes a completed suggestion request. A failed decode keeps the
    /// suggestions already on screen.
    pub fn apply_generation(&mut self, outcome: GenerationOutcome) -> Result<Applied, ClientError> {
        if self.latest_generation != Some(outcome.token) {
            debug!(token = outcome.token.value(), "dropping stale suggestion response");
            return Ok(Applied::Stale);
        }
        self.latest_generation = None;

        let raw = outcome.result?;
        let decoded = decode(&raw).map_err(|err| {
            warn!(error = %err, "could not decode suggestion envelope");
            ClientError::from(err)
        })?;
        info!(groups = decoded.len(), "decoded lesson plan suggestions");
        self.suggestions = decoded;
        Ok(Applied::Current)
    }

    pub async fn generate(&mut self) -> Result<Applied, ClientError> {
        let pending = self.begin_generation()?;
        let outcome = pending.run(self.api.as_ref()).await;
        self.apply_generation(outcome)
    }

    /// Forgets the file and everything derived from it; in-flight requests
    /// become stale. The subject is kept.
    pub fn remove_file(&mut self) {
        if let Some(file) = self.file.take() {
            info!(filename = %file.filename, "removed file");
        }
        self.deck = SlideDeck::default();
        self.suggestions.clear();
        self.latest_conversion = None;
        self.latest_generation = None;
    }
}

/// Syllabus flow: upload the document, then ask for markdown suggestions
/// about the stored copy.
pub async fn request_content_suggestion(
    api: &dyn UpTeachApi,
    file: &UploadedFile,
    subject: &str,
) -> Result<String, ClientError> {
    if subject.trim().is_empty() {
        return Err(ValidationError::EmptySubject.into());
    }
    let stored_as = api.upload(file, subject).await?;
    info!(filename = %stored_as, "uploaded syllabus");
    api.content_suggest(&stored_as, subject).await
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
