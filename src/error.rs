use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error("invalid keyword: {0:?}")]
    InvalidKeyword(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("embedding provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("embedding request timed out after {0:?}")]
    ProviderTimeout(Duration),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ClusterError {
    /// Provider failures are recovered locally by degrading to rule-only
    /// clustering; everything else propagates to the caller.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ProviderUnavailable(_) | Self::ProviderTimeout(_))
    }
}
