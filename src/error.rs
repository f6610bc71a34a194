//! Unified error types for sqlkv.

use tokio_rusqlite::rusqlite;

/// Unified error type for cache construction and the five cache operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Value could not be serialized to the canonical JSON payload.
    #[error("encode failed for key '{key}': {source}")]
    Encode { key: String, source: serde_json::Error },

    /// Stored payload does not structurally match the requested shape.
    #[error("decode failed for key '{key}': {source}")]
    Decode { key: String, source: serde_json::Error },

    /// A cache operation failed against the backing store.
    #[error("cache {op} failed (key: {key:?}): {source}")]
    Operation { op: &'static str, key: Option<String>, source: tokio_rusqlite::Error },

    /// Database operation failed.
    #[error("database error: {0}")]
    Database(tokio_rusqlite::Error),

    /// Schema bootstrap failed; the cache cannot be constructed.
    #[error("schema bootstrap failed: {0}")]
    Bootstrap(String),

    /// Cache construction attempted while disabled by configuration.
    #[error("cache is disabled by configuration")]
    Disabled,
}

impl Error {
    /// Attach operation context to a raw database error.
    ///
    /// Codec and bootstrap errors already carry their context and pass
    /// through unchanged.
    pub(crate) fn into_operation(self, op: &'static str, key: Option<&str>) -> Self {
        match self {
            Error::Database(source) => Error::Operation { op, key: key.map(str::to_owned), source },
            other => other,
        }
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_display_includes_op_and_key() {
        let raw = Error::Database(tokio_rusqlite::Error::ConnectionClosed);
        let err = raw.into_operation("set", Some("session:42"));
        let msg = err.to_string();
        assert!(msg.contains("set"));
        assert!(msg.contains("session:42"));
    }

    #[test]
    fn test_into_operation_keeps_codec_context() {
        let source = serde_json::from_str::<u32>("not json").unwrap_err();
        let err = Error::Decode { key: "k".into(), source };
        let err = err.into_operation("get", Some("k"));
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_disabled_display() {
        let err = Error::Disabled;
        assert!(err.to_string().contains("disabled"));
    }
}
