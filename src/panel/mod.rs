/*!
 * Client for the PloudOS control panel.
 *
 * This module contains:
 * - `client`: the session client and its polling lifecycle operations
 * - `server_info`: typed view over the status endpoint's JSON
 * - `transport`: reqwest implementation of the `Transport` trait
 */

use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

use crate::errors::PanelError;

/// HTTP seam between the panel client and the network
///
/// The client only needs a form POST, a JSON GET and read access to the
/// session cookie jar, which keeps it testable without a live panel.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// POST a urlencoded form; the response body is discarded
    async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Result<(), PanelError>;

    /// GET a path relative to the panel root and decode the body as JSON
    async fn get_json(&self, path: &str) -> Result<Value, PanelError>;

    /// Value of the named cookie for the panel root, if the jar holds one
    fn cookie(&self, name: &str) -> Option<String>;

    /// Human readable dump of the cookie jar, used in login errors
    fn cookie_summary(&self) -> String;

    /// Release the underlying connections; later requests fail with `SessionClosed`
    fn close(&mut self);
}

pub mod client;
pub mod server_info;
pub mod transport;

pub use client::{Endpoint, PanelClient, PollSettings, SESSION_COOKIE};
pub use server_info::ServerInfo;
pub use transport::HttpTransport;
