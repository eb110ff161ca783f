use thiserror::Error;

/// Address resolution failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Address not found: {token}")]
    NotFound { token: String },
    #[error("Ambiguous address '{token}', candidates: {}", candidates.join(", "))]
    Ambiguous {
        token: String,
        candidates: Vec<String>,
    },
}

impl ResolveError {
    pub fn not_found(token: impl Into<String>) -> Self {
        ResolveError::NotFound {
            token: token.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::NotFound { .. })
    }
}
