use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthorizeError {
    #[error("invalid service URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("failed to reach authorization service: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{message}")]
    Response {
        status: u16,
        code: String,
        message: String,
    },

    #[error("failed to parse authorize response: {0}")]
    Deserialization(String),
}

impl AuthorizeError {
    /// Machine-readable error code, carried into failure responses.
    ///
    /// `Response` errors keep the code reported by the service itself;
    /// everything else maps to a stable local code.
    pub fn code(&self) -> &str {
        match self {
            Self::Url(_) => "invalid_url",
            Self::ClientBuild(_) => "client_error",
            Self::Request(_) => "connection_error",
            Self::Response { code, .. } => code,
            Self::Deserialization(_) => "parse_error",
        }
    }
}
