use serde::{Deserialize, Serialize};

/// JSON error body returned for every failed request: `{"error": "..."}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

impl From<crate::DiagnosticError> for ErrorBody {
    fn from(err: crate::DiagnosticError) -> Self {
        Self::new(err.to_string())
    }
}
