#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("feed returned unexpected status: {0}")]
    Status(u16),
    #[error("failed to parse feed payload: {0}")]
    Payload(String),
    #[error("radar product unavailable: {0}")]
    RadarUnavailable(String),
}
