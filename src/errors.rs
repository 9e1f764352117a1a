use std::fmt;

/// Errors surfaced by the remote data gateway.
///
/// Every variant is a read failure; none of them is fatal and all of them can
/// be retried by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// The request exceeded the configured deadline.
    Timeout {
        /// The URL that timed out.
        url: String,
    },
    /// No response was received (connection refused, DNS failure, reset).
    NetworkUnreachable(String),
    /// The server answered with a non-2xx status.
    ServerError {
        /// HTTP status code.
        status: u16,
        /// Response body as text (may be empty).
        body: String,
    },
    /// The payload could not be decoded into the expected shape.
    MalformedResponse(String),
}

/// Fieldless classification of a [`GatewayError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Timeout,
    NetworkUnreachable,
    ServerError,
    MalformedResponse,
}

impl GatewayError {
    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::Timeout { .. } => ErrorKind::Timeout,
            GatewayError::NetworkUnreachable(_) => ErrorKind::NetworkUnreachable,
            GatewayError::ServerError { .. } => ErrorKind::ServerError,
            GatewayError::MalformedResponse(_) => ErrorKind::MalformedResponse,
        }
    }

    /// Whether the retry policy may re-issue the identical request.
    ///
    /// Only transport-level failures qualify. A server answer or a bad payload
    /// goes straight back to the caller.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Timeout | ErrorKind::NetworkUnreachable
        )
    }

    /// Text shown to the user next to the retry affordance.
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Timeout { .. } => {
                "The server took too long to respond. Please try again.".to_string()
            }
            GatewayError::NetworkUnreachable(_) => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            GatewayError::ServerError { status: 404, .. } => {
                "The requested record was not found.".to_string()
            }
            GatewayError::ServerError { status, .. } => {
                format!("The server returned an error ({}). Please try again.", status)
            }
            GatewayError::MalformedResponse(_) => {
                "Invalid response format from server.".to_string()
            }
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::NetworkUnreachable => "network-unreachable",
            ErrorKind::ServerError => "server-error",
            ErrorKind::MalformedResponse => "malformed-response",
        };
        f.write_str(name)
    }
}

impl fmt::Display for GatewayError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Timeout { url } => write!(f, "Request timed out: {}", url),
            GatewayError::NetworkUnreachable(msg) => write!(f, "Network unreachable: {}", msg),
            GatewayError::ServerError { status, body } => {
                write!(f, "Server returned {}: {}", status, body)
            }
            GatewayError::MalformedResponse(msg) => write!(f, "Malformed response: {}", msg),
        }
    }
}

impl std::error::Error for GatewayError {}

impl From<reqwest::Error> for GatewayError {
    /// Classifies a transport error from `reqwest`.
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            let url = err
                .url()
                .map(|u| u.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            return GatewayError::Timeout { url };
        }
        if err.is_decode() {
            return GatewayError::MalformedResponse(err.to_string());
        }
        if let Some(status) = err.status() {
            return GatewayError::ServerError {
                status: status.as_u16(),
                body: String::new(),
            };
        }
        GatewayError::NetworkUnreachable(err.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::MalformedResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transport_errors_are_transient() {
        assert!(GatewayError::Timeout {
            url: "http://x".to_string()
        }
        .is_transient());
        assert!(GatewayError::NetworkUnreachable("refused".to_string()).is_transient());
        assert!(!GatewayError::ServerError {
            status: 503,
            body: "busy".to_string()
        }
        .is_transient());
        assert!(!GatewayError::MalformedResponse("not an array".to_string()).is_transient());
    }

    #[test]
    fn test_kind_names_match_taxonomy() {
        assert_eq!(ErrorKind::Timeout.to_string(), "timeout");
        assert_eq!(ErrorKind::NetworkUnreachable.to_string(), "network-unreachable");
        assert_eq!(ErrorKind::ServerError.to_string(), "server-error");
        assert_eq!(ErrorKind::MalformedResponse.to_string(), "malformed-response");
    }

    #[test]
    fn test_user_message_distinguishes_not_found() {
        let not_found = GatewayError::ServerError {
            status: 404,
            body: "{\"detail\":\"Business not found\"}".to_string(),
        };
        assert!(not_found.user_message().contains("not found"));

        let unavailable = GatewayError::ServerError {
            status: 502,
            body: String::new(),
        };
        assert!(unavailable.user_message().contains("502"));
    }

    #[test]
    fn test_serde_error_maps_to_malformed() {
        let err = serde_json::from_str::<Vec<u32>>("{}").unwrap_err();
        assert_eq!(GatewayError::from(err).kind(), ErrorKind::MalformedResponse);
    }
}
