//! Session-scoped values
//!
//! Nothing here is written to disk; it lives as long as the `QuoteBook`
//! that owns it.

/// Values that are cleared when the session ends
#[derive(Debug, Default, Clone)]
pub struct SessionState {
    last_viewed: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text of the most recently displayed quote
    pub fn last_viewed(&self) -> Option<&str> {
        self.last_viewed.as_deref()
    }

    pub fn set_last_viewed(&mut self, text: impl Into<String>) {
        self.last_viewed = Some(text.into());
    }
}
