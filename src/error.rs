use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("cannot build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("{url} answered with HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("row {index} is malformed: expected 2 name/code elements, found {found}")]
    MalformedRow { index: usize, found: usize },

    #[error("page has no {0} section")]
    MissingSection(&'static str),

    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, ScraperError>;
