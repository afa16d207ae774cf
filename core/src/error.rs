use thiserror::Error;

/// Errors produced by the search core.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("invalid search mode: {0}")]
    InvalidMode(String),

    #[error("query syntax error: {0}")]
    QuerySyntax(String),

    #[error("snapshot format error: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SearchError>;

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            return SearchError::Io(err.into());
        }
        SearchError::Format(err.to_string())
    }
}

impl From<bincode::Error> for SearchError {
    fn from(err: bincode::Error) -> Self {
        match *err {
            bincode::ErrorKind::Io(io) => SearchError::Io(io),
            other => SearchError::Format(other.to_string()),
        }
    }
}

impl SearchError {
    /// True for errors caused by the query text rather than by the engine.
    pub fn is_query_error(&self) -> bool {
        matches!(self, SearchError::QuerySyntax(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_errors_become_format_errors() {
        let err: SearchError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, SearchError::Format(_)));
    }

    #[test]
    fn only_syntax_errors_are_query_errors() {
        assert!(SearchError::QuerySyntax("x".into()).is_query_error());
        assert!(!SearchError::Format("x".into()).is_query_error());
        assert!(!SearchError::InvalidMode("x".into()).is_query_error());
    }
}
