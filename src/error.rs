//! Error type shared by every layer of the console.

use thiserror::Error;

/// Result alias used across the console crate.
pub type ConsoleResult<T> = Result<T, ConsoleError>;

#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Rejected before any network call was made.
    #[error("{0}")]
    Validation(String),

    /// The backend answered 401. The session has already been cleared when
    /// this is returned; `redirect` is where the caller must navigate.
    #[error("{message}")]
    Unauthorized { message: String, redirect: String },

    /// The access gate refused the route; `redirect` is where to go instead.
    #[error("{title} is not available to this session")]
    Forbidden { title: String, redirect: String },

    /// Any other non-success status. `message` is whatever the server put in
    /// its error payload, if the payload shape was recognized.
    #[error("{}", api_message(.status, .message))]
    Api {
        status: u16,
        message: Option<String>,
    },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("session storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ConsoleError {
    /// Navigation target carried by an authorization failure.
    pub fn redirect(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { redirect, .. } | Self::Forbidden { redirect, .. } => {
                Some(redirect.as_str())
            }
            _ => None,
        }
    }

    /// Message for a failed save/delete: the server's own wording when it
    /// sent one, otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Api {
                message: Some(message),
                ..
            }
            | Self::Unauthorized { message, .. }
            | Self::Validation(message) => message.clone(),
            _ => fallback.to_owned(),
        }
    }
}

fn api_message(status: &u16, message: &Option<String>) -> String {
    match message {
        Some(message) => message.clone(),
        None => format!("server returned status {status}"),
    }
}
