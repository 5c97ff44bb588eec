use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}: {body}")]
    UnexpectedStatus {
        status: u16,
        url: String,
        body: String,
    },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("upload error: {0}")]
    Upload(String),

    #[error("timed out waiting for {what} after {attempts} attempts")]
    Timeout { what: String, attempts: u32 },

    #[error("capabilities error: {0}")]
    Capabilities(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("missing field `{0}` in response")]
    MissingField(&'static str),
}

impl HarnessError {
    /// Build an `UnexpectedStatus` from a response, consuming its body for
    /// the diagnostic message.
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();
        HarnessError::UnexpectedStatus { status, url, body }
    }

    /// Status code carried by an `UnexpectedStatus`, if that is what this is.
    pub fn status(&self) -> Option<u16> {
        match self {
            HarnessError::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type HarnessResult<T> = Result<T, HarnessError>;
