#[derive(thiserror::Error, Debug)]
pub enum BustimeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Error response: {0}")]
    Status(u16),

    #[error("Response body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("Deserialize error: {0}")]
    Deserialize(#[from] serde_json::Error),
}

pub type BustimeResult<T> = Result<T, BustimeError>;
