use shared::{
    domain::OrderId,
    error::{UnrecognizedActivityFlag, ValidationError},
};
use thiserror::Error;

use crate::view::ViewMode;

pub type Result<T, E = ClientError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("network failure calling {endpoint}: {source}")]
    Network {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("HTTP error {status} from {endpoint}")]
    Http { status: u16, endpoint: String },
    #[error("malformed response body from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("empty response body from {endpoint}")]
    MissingBody { endpoint: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("order {order_id}: {source}")]
    ClassificationAmbiguity {
        order_id: OrderId,
        #[source]
        source: UnrecognizedActivityFlag,
    },
    #[error("not signed in")]
    NotAuthenticated,
    #[error("{action} is not available while {mode:?}")]
    InvalidTransition {
        action: &'static str,
        mode: ViewMode,
    },
    #[error("another action is still in progress")]
    Busy,
    #[error("session store failure: {0:#}")]
    Storage(anyhow::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|status| status >= 500)
    }

    /// Text suitable for showing to the operator.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Http {
                status: 404,
                endpoint,
            } => not_found_message(endpoint).to_string(),
            ClientError::Http { status, .. } if *status >= 500 => {
                "Server error. Please try again later.".to_string()
            }
            ClientError::Http { status, .. } => format!("Request rejected (HTTP {status})."),
            ClientError::Network { .. } => {
                "Network error: the API could not be reached.".to_string()
            }
            ClientError::Decode { .. } | ClientError::MissingBody { .. } => {
                "The server sent an unexpected response.".to_string()
            }
            ClientError::Validation(err) => format!("Invalid order: {err}."),
            ClientError::ClassificationAmbiguity { order_id, source } => {
                format!("Order {order_id} has an unreadable status ({}).", source.raw)
            }
            ClientError::NotAuthenticated => "Please sign in first.".to_string(),
            ClientError::InvalidTransition { action, .. } => {
                format!("Cannot {action} orders in the current list.")
            }
            ClientError::Busy => "Another action is still in progress.".to_string(),
            ClientError::Storage(_) => "Local session data could not be read.".to_string(),
        }
    }
}

fn not_found_message(endpoint: &str) -> &'static str {
    let path = endpoint.split('?').next().unwrap_or_default();
    if path.contains("/Orders") {
        "Order not found."
    } else if path.contains("/Stocks") {
        "Stock item not found."
    } else if path.contains("/Customers") {
        "Customer not found."
    } else {
        "Not found."
    }
}
