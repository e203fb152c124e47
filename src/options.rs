#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Opening token of an annotated block; the language tag follows it up to the first `]`.
    pub start_pattern: String,
    /// Token that closes an annotated block.
    pub end_marker: String,
    /// Keep trailing bytes that may begin a marker out of the pending display.
    pub hold_back_partial: bool,
    /// Optional soft cap for the internal buffer. Committed text is dropped once exceeded.
    pub max_buffer_bytes: Option<usize>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            start_pattern: "```[".to_string(),
            end_marker: "```".to_string(),
            hold_back_partial: true,
            max_buffer_bytes: None,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OptionsError {
    #[error("start pattern must not be empty")]
    EmptyStartPattern,
    #[error("end marker must not be empty")]
    EmptyEndMarker,
    #[error("start pattern {0:?} must not contain the closing bracket `]`")]
    BracketInStartPattern(String),
}

impl Options {
    pub fn new(start_pattern: impl Into<String>, end_marker: impl Into<String>) -> Self {
        Self {
            start_pattern: start_pattern.into(),
            end_marker: end_marker.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.start_pattern.is_empty() {
            return Err(OptionsError::EmptyStartPattern);
        }
        if self.end_marker.is_empty() {
            return Err(OptionsError::EmptyEndMarker);
        }
        if self.start_pattern.contains(']') {
            return Err(OptionsError::BracketInStartPattern(
                self.start_pattern.clone(),
            ));
        }
        Ok(())
    }
}
