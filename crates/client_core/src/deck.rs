use shared::domain::DocumentKind;

/// Rendered pages of the selected document with a 1-based cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlideDeck {
    kind: Option<DocumentKind>,
    slides: Vec<String>,
    current: usize,
}

impl SlideDeck {
    pub fn new(kind: DocumentKind, slides: Vec<String>) -> Self {
        Self {
            kind: Some(kind),
            slides,
            current: 0,
        }
    }

    pub fn kind(&self) -> Option<DocumentKind> {
        self.kind
    }

    pub fn slides(&self) -> &[String] {
        &self.slides
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// 1-based index of the page on screen; 1 even for an empty deck.
    pub fn position(&self) -> u32 {
        u32::try_from(self.current + 1).unwrap_or(u32::MAX)
    }

    pub fn current_url(&self) -> Option<&str> {
        self.slides.get(self.current).map(String::as_str)
    }

    pub fn has_next(&self) -> bool {
        self.current + 1 < self.slides.len()
    }

    pub fn has_previous(&self) -> bool {
        self.current > 0
    }

    pub fn next_slide(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.current += 1;
        true
    }

    pub fn previous_slide(&mut self) -> bool {
        if !self.has_previous() {
            return false;
        }
        self.current -= 1;
        true
    }

    /// Moves to a 1-based position; out-of-range positions leave the cursor alone.
    pub fn jump_to(&mut self, position: u32) -> bool {
        let Some(index) = (position as usize).checked_sub(1) else {
            return false;
        };
        if index >= self.slides.len() {
            return false;
        }
        self.current = index;
        true
    }

    pub fn label(&self) -> &'static str {
        self.kind.unwrap_or(DocumentKind::Pptx).page_label()
    }

    pub fn indicator(&self) -> String {
        format!("{} / {}", self.position(), self.len())
    }
}

#[cfg(test)]
#[path = "tests/deck_tests.rs"]
mod tests;
