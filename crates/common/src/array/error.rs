use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ArrayError {
    #[error("HTTP request failed: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("HTTP status {0}: {1}")]
    HttpStatus(StatusCode, String),
    #[error("invalid response body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
    #[error("login response did not include an x-auth-token header")]
    MissingAuthToken,
    #[error("not logged in to the array")]
    NotAuthenticated,
}
