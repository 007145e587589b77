//! Mapping of MongoDB driver errors onto `DocLinkError`

use doclink_core::DocLinkError;
use mongodb::error::{Error, ErrorKind};

/// Whether `kind` means the client's connection was dropped.
///
/// A shut-down client, a socket I/O failure and a cleared connection pool
/// are treated as disconnects. Server selection timeouts are not: the
/// client is still usable once a server becomes selectable again.
pub fn is_disconnect_kind(kind: &ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::Shutdown | ErrorKind::Io(_) | ErrorKind::ConnectionPoolCleared { .. }
    )
}

/// Classify a driver error
pub fn classify(err: Error) -> DocLinkError {
    let kind = err.kind.as_ref();
    if is_disconnect_kind(kind) {
        return DocLinkError::Disconnected(err.to_string());
    }
    match kind {
        ErrorKind::InvalidArgument { .. } | ErrorKind::InvalidTlsConfig { .. } => {
            DocLinkError::InvalidConfiguration(err.to_string())
        }
        ErrorKind::BsonSerialization(_) | ErrorKind::BsonDeserialization(_) => {
            DocLinkError::Serialization(err.to_string())
        }
        _ => DocLinkError::OperationFailed(err.to_string()),
    }
}
