//! Error taxonomy shared by the tokenizer, the executor and the batch runner.

/// Everything that can go wrong while parsing or executing a query.
///
/// Parse-time variants ([`ParseToken`](QueryError::ParseToken) and the
/// structural flavours of [`WrongQueryParameter`](QueryError::WrongQueryParameter))
/// are raised before any side effect happens.  Execution-time variants abort
/// the query after whatever mutations already went through; those are not
/// rolled back.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// Malformed token syntax: unbalanced parentheses, a value without a
    /// keyword, an unparsable `keyword(value)` shape.
    #[error("{0}")]
    ParseToken(String),

    /// A value failed semantic validation (bad window id, desktop out of
    /// range, invalid regex, missing value, wrong unary arity, ...).
    #[error("{0}")]
    WrongQueryParameter(String),

    /// A filter or selection step yielded no windows.
    #[error("{0}")]
    EmptyQueryResult(String),

    /// Structurally valid but inconsistent query (unknown token, `ACTIVE`
    /// on several windows, an action with no resolved targets).
    #[error("{0}")]
    ExecuteQuery(String),

    /// The window-system backend reported a failure.
    #[error("{0}")]
    Backend(String),
}

impl QueryError {
    /// Label printed in front of the message when a query fails.
    pub fn label(&self) -> &'static str {
        match self {
            QueryError::ParseToken(_) => "ParseTokenError",
            QueryError::WrongQueryParameter(_) => "WrongQueryParameterError",
            QueryError::EmptyQueryResult(_) => "EmptyQueryResult",
            QueryError::ExecuteQuery(_) => "ExecuteQueryError",
            QueryError::Backend(_) => "BackendError",
        }
    }

    pub(crate) fn backend(e: impl std::fmt::Display) -> Self {
        QueryError::Backend(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_match_variants() {
        assert_eq!(QueryError::ParseToken("x".into()).label(), "ParseTokenError");
        assert_eq!(
            QueryError::WrongQueryParameter("x".into()).label(),
            "WrongQueryParameterError"
        );
        assert_eq!(QueryError::EmptyQueryResult("x".into()).label(), "EmptyQueryResult");
        assert_eq!(QueryError::ExecuteQuery("x".into()).label(), "ExecuteQueryError");
        assert_eq!(QueryError::Backend("x".into()).label(), "BackendError");
    }

    #[test]
    fn display_is_the_bare_message() {
        let e = QueryError::EmptyQueryResult("no windows matched".into());
        assert_eq!(e.to_string(), "no windows matched");
    }
}
