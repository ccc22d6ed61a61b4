use mongodb::error::{Error, ErrorKind};

/// Server error codes meaning the request itself was rejected
/// (BadValue, FailedToParse, invalid regex).
const INVALID_REQUEST_CODES: &[i32] = &[2, 9, 51091];

/// Coarse category of a driver error, used to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFailure {
    /// The store could not be reached or dropped the connection
    Unavailable,
    /// The store refused the request as malformed
    InvalidRequest,
    Other,
}

pub fn classify(err: &Error) -> StoreFailure {
    match err.kind.as_ref() {
        ErrorKind::ServerSelection { .. }
        | ErrorKind::Io(_)
        | ErrorKind::ConnectionPoolCleared { .. }
        | ErrorKind::DnsResolve { .. } => StoreFailure::Unavailable,
        ErrorKind::Command(command) if INVALID_REQUEST_CODES.contains(&command.code) => {
            StoreFailure::InvalidRequest
        }
        ErrorKind::InvalidArgument { .. } => StoreFailure::InvalidRequest,
        _ => StoreFailure::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::Client;
    use mongodb::bson::doc;
    use mongodb::options::ClientOptions;
    use std::time::Duration;

    #[tokio::test]
    async fn test_unreachable_server_is_unavailable() {
        let mut options = ClientOptions::parse("mongodb://127.0.0.1:1").await.unwrap();
        options.server_selection_timeout = Some(Duration::from_millis(200));
        let db = Client::with_options(options).unwrap().database("test");

        let err = db.run_command(doc! { "ping": 1 }).await.unwrap_err();
        assert_eq!(classify(&err), StoreFailure::Unavailable);
    }

    #[tokio::test]
    async fn test_malformed_connection_string_is_invalid_request() {
        let err = ClientOptions::parse("definitely not a uri").await.unwrap_err();
        assert_eq!(classify(&err), StoreFailure::InvalidRequest);
    }
}
