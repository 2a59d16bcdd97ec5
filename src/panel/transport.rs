use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::errors::PanelError;
use crate::panel::Transport;

/// reqwest-backed transport holding the session cookie jar
#[derive(Debug)]
pub struct HttpTransport {
    /// Panel root, e.g. `https://ploudos.com`
    base_url: Url,
    /// HTTP client; `None` once the session has been closed
    client: Option<Client>,
    /// Cookie jar shared with the client
    jar: Arc<Jar>,
}

impl HttpTransport {
    /// Create a new transport for the given panel root URL.
    ///
    /// `timeout` bounds each individual request; `None` lets a request wait forever.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, PanelError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| PanelError::RequestFailed(format!("Invalid base URL '{}': {}", base_url, e)))?;

        let jar = Arc::new(Jar::default());
        let mut builder = Client::builder().cookie_provider(Arc::clone(&jar));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| PanelError::RequestFailed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            client: Some(client),
            jar,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.client.is_none()
    }

    fn client(&self) -> Result<&Client, PanelError> {
        self.client.as_ref().ok_or(PanelError::SessionClosed)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Result<(), PanelError> {
        let url = self.url(path);
        debug!("POST {}", url);

        // Only the cookie jar matters here; the status of the (redirected) response does not.
        self.client()?
            .post(&url)
            .form(form)
            .send()
            .await
            .map_err(|e| PanelError::RequestFailed(format!("POST {} failed: {}", url, e)))?;

        Ok(())
    }

    async fn get_json(&self, path: &str) -> Result<Value, PanelError> {
        let url = self.url(path);
        debug!("GET {}", url);

        let response = self.client()?
            .get(&url)
            .send()
            .await
            .map_err(|e| PanelError::RequestFailed(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        let body = response.text().await
            .map_err(|e| PanelError::RequestFailed(format!("Failed to read response from {}: {}", url, e)))?;

        // The panel reports failures in the JSON body; the status code only matters
        // when there is no JSON to hand back.
        match serde_json::from_str::<Value>(&body) {
            Ok(value) => {
                if !status.is_success() {
                    debug!("PloudOS answered {} with a JSON body", status);
                }
                Ok(value)
            }
            Err(_) if !status.is_success() => {
                error!("PloudOS API error ({}): {}", status, body);
                Err(PanelError::ApiError {
                    status_code: status.as_u16(),
                    message: body,
                })
            }
            Err(e) => {
                let snippet: String = body.chars().take(200).collect();
                Err(PanelError::ParseError(format!("{} (body starts with: {})", e, snippet)))
            }
        }
    }

    fn cookie(&self, name: &str) -> Option<String> {
        let header = self.jar.cookies(&self.base_url)?;
        let header = header.to_str().ok()?;
        find_cookie(header, name)
    }

    fn cookie_summary(&self) -> String {
        self.jar
            .cookies(&self.base_url)
            .and_then(|header| header.to_str().map(str::to_string).ok())
            .unwrap_or_else(|| "<none>".to_string())
    }

    fn close(&mut self) {
        if self.client.take().is_some() {
            debug!("Released HTTP client for {}", self.base_url);
        }
    }
}

/// Find a cookie value in a `Cookie` request header (`a=1; b=2`)
pub(crate) fn find_cookie(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}
