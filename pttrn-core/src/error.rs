use thiserror::Error;

/// Errors raised by the fallible helpers of the pattern utilities.
///
/// Event handlers never propagate these; they log and leave the page as is.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
    #[error("Network error: {0}")]
    Network(String),
    #[error("platform error: {0}")]
    Platform(String),
    #[error("{0} is not supported in this environment")]
    Unsupported(&'static str),
    #[error("no element matches `{0}`")]
    MissingElement(String),
}

impl PatternError {
    pub(crate) fn selector(selector: &str, reason: impl Into<String>) -> Self {
        Self::Selector {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failing_input() {
        let err = PatternError::selector("[data-js", "unterminated attribute");
        assert_eq!(
            err.to_string(),
            "invalid selector `[data-js`: unterminated attribute"
        );
        let err = PatternError::MissingElement("#panel".into());
        assert!(err.to_string().contains("#panel"));
    }

    #[test]
    fn json_errors_convert() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: PatternError = parse.unwrap_err().into();
        assert!(matches!(err, PatternError::Json(_)));
    }
}
