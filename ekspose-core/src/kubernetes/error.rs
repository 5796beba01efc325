use thiserror::Error;

const ALREADY_EXISTS_REASON: &str = "AlreadyExists";

/// A cluster API failure, classified by what the caller can do about it.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("Resource doesn't exist!")]
    NotFound,
    #[error("Resource already exists!")]
    AlreadyExists,
    #[error("Cluster API is temporarily unavailable! Reason: {}", .0)]
    Transient(kube::Error),
    #[error("Cluster API request failed! Reason: {}", .0)]
    Other(kube::Error),
}

impl ClusterError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ClusterError::Transient(_))
    }
}

impl From<kube::Error> for ClusterError {
    fn from(error: kube::Error) -> Self {
        let status = match &error {
            kube::Error::Api(response) => {
                Some((response.code, response.reason == ALREADY_EXISTS_REASON))
            }
            _ => None,
        };

        match status {
            Some((404, _)) => ClusterError::NotFound,
            Some((409, true)) => ClusterError::AlreadyExists,
            // conflicts and throttling clear up on their own
            Some((409 | 429 | 500 | 502 | 503 | 504, _)) => ClusterError::Transient(error),
            Some(_) => ClusterError::Other(error),
            None if is_connection_error(&error) => ClusterError::Transient(error),
            None => ClusterError::Other(error),
        }
    }
}

fn is_connection_error(error: &kube::Error) -> bool {
    matches!(error, kube::Error::HyperError(_) | kube::Error::Service(_))
}

#[cfg(test)]
mod tests {
    use kube::error::ErrorResponse;

    use super::ClusterError;

    fn api_error(code: u16, reason: &str) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_owned(),
            message: format!("request failed with {reason}"),
            reason: reason.to_owned(),
            code,
        })
    }

    #[test]
    fn not_found_and_already_exists_are_recognized() {
        assert!(matches!(
            ClusterError::from(api_error(404, "NotFound")),
            ClusterError::NotFound
        ));
        assert!(matches!(
            ClusterError::from(api_error(409, "AlreadyExists")),
            ClusterError::AlreadyExists
        ));
    }

    #[test]
    fn throttling_and_server_errors_are_transient() {
        for (code, reason) in [
            (409, "Conflict"),
            (429, "TooManyRequests"),
            (500, "InternalError"),
            (503, "ServiceUnavailable"),
            (504, "Timeout"),
        ] {
            let error = ClusterError::from(api_error(code, reason));

            assert!(error.is_transient(), "{code} should be transient");
        }
    }

    #[test]
    fn client_errors_are_permanent() {
        for (code, reason) in [(400, "BadRequest"), (403, "Forbidden"), (422, "Invalid")] {
            let error = ClusterError::from(api_error(code, reason));

            assert!(matches!(error, ClusterError::Other(_)), "{code} should be permanent");
        }
    }
}
