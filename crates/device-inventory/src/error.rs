//! Error types for device-inventory

use thiserror::Error;

/// Errors that can occur while talking to the device inventory
#[derive(Error, Debug)]
pub enum InventoryError {
    /// The service answered with a non-success status code
    #[error("Inventory request to {endpoint} returned status {status}: {message}")]
    Status {
        endpoint: String,
        status: u16,
        message: String,
    },

    /// Transport-level failure (connect, TLS, timeout)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Response body could not be decoded
    #[error("Failed to decode inventory response: {0}")]
    Decode(String),

    /// Requested batch is larger than a single call accepts
    #[error("Batch of {requested} ids exceeds the per-call limit of {limit}")]
    BatchLimit { requested: usize, limit: usize },

    /// Client configuration is unusable
    #[error("Invalid inventory configuration: {0}")]
    Config(String),
}

impl InventoryError {
    /// Status code of the failed request, when the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            InventoryError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for InventoryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            InventoryError::Decode(err.to_string())
        } else {
            InventoryError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for InventoryError {
    fn from(err: serde_json::Error) -> Self {
        InventoryError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = InventoryError::Status {
            endpoint: "/devices/queries/devices-scroll/v1".to_string(),
            status: 429,
            message: "rate limited".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("429"));
        assert!(msg.contains("devices-scroll"));
        assert_eq!(err.status(), Some(429));
    }

    #[test]
    fn test_non_status_errors_have_no_code() {
        assert_eq!(InventoryError::Http("reset".to_string()).status(), None);
        assert_eq!(
            InventoryError::BatchLimit {
                requested: 5001,
                limit: 5000
            }
            .status(),
            None
        );
    }
}
