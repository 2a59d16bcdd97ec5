/*!
 * Error types for the ploudos client.
 *
 * This module contains the panel client's error type, using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when talking to the PloudOS control panel
#[derive(Error, Debug)]
pub enum PanelError {
    /// Login finished without the panel handing out a session cookie
    #[error("Authentication error: failed to login into PloudOS. Cookies in the session: {cookies}")]
    AuthenticationError {
        /// Cookies present in the jar after the login attempt
        cookies: String,
    },

    /// A control endpoint answered with a truthy `error` field
    #[error("Remote action '{action}' failed. Error: {body}")]
    RemoteActionError {
        /// Name of the action that was attempted
        action: String,
        /// Raw response body returned by the panel
        body: serde_json::Value,
    },

    /// A polling loop ran out of iterations
    #[error("Timed out waiting for {operation} after {polls} polls")]
    TimeoutError {
        /// Operation whose polling loop expired
        operation: String,
        /// Number of status polls performed
        polls: u32,
    },

    /// Error when sending a request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing a response body fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Non-success HTTP status returned by the panel
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Response body or reason
        message: String,
    },

    /// The session was released by `close()`
    #[error("Session is closed")]
    SessionClosed,
}

impl PanelError {
    /// Whether this error came from a bounded polling loop
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimeoutError { .. })
    }
}
