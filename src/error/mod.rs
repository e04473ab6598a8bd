use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiErrorKind {
    Network,
    Http,
    Parse,
}

/// A failed request. Every failure the admin backend can produce collapses into
/// one of three kinds; there is no finer server-side taxonomy.
#[derive(Clone, Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn network(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: e.to_string(),
        }
    }

    pub(crate) fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: e.to_string(),
        }
    }

    pub(crate) fn http(status: reqwest::StatusCode, body: String, ctx: &str) -> Self {
        Self {
            kind: ApiErrorKind::Http,
            message: format!("{ctx} ({status}): {body}"),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Failure to recover an entity context from `data-*` annotations.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ContextError {
    #[error("no element carries `{attribute}`")]
    MissingAnnotation { attribute: &'static str },

    #[error("`{attribute}` is not a numeric id: {value:?}")]
    InvalidId {
        attribute: &'static str,
        value: String,
    },

    #[error("no enclosing `sections` container")]
    MissingSection,

    #[error("form has no `{name}` control")]
    MissingControl { name: &'static str },

    #[error("browser call failed: {0}")]
    Js(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_message_carries_status_and_body() {
        let err = ApiError::http(
            reqwest::StatusCode::NOT_FOUND,
            "entity 42 not found".to_string(),
            "Request failed",
        );
        assert_eq!(err.kind, ApiErrorKind::Http);
        assert_eq!(
            err.to_string(),
            "Request failed (404 Not Found): entity 42 not found"
        );
    }

    #[test]
    fn context_error_display() {
        let err = ContextError::InvalidId {
            attribute: "data-id",
            value: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "`data-id` is not a numeric id: \"abc\"");
        assert_eq!(
            ContextError::MissingSection.to_string(),
            "no enclosing `sections` container"
        );
    }
}
