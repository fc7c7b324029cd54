use thiserror::Error;

/// Failure of a single page fetch.
///
/// These never leave the redirect or content checks: each check turns a
/// fetch failure into its most conservative signal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("server answered with status {0}")]
    Status(u16),

    #[error("request timed out")]
    Timeout,

    #[error("gave up after {0} redirects")]
    TooManyRedirects(usize),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to read body: {0}")]
    Body(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_builder() {
            Self::InvalidUrl(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else if err.is_body() || err.is_decode() {
            Self::Body(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Errors an evaluation can surface to its caller.
#[derive(Debug, Error)]
pub enum EvalError {
    /// The request carried no URL, or an empty one.
    #[error("URL is required")]
    MissingUrl,

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_url_message_matches_wire_error() {
        assert_eq!(EvalError::MissingUrl.to_string(), "URL is required");
    }

    #[test]
    fn status_error_names_code() {
        assert_eq!(
            FetchError::Status(404).to_string(),
            "server answered with status 404"
        );
    }
}
