/*!
 * Mock transport for testing
 *
 * Scripted stand-in for the HTTP transport so the panel client can be driven
 * without a live panel. Responses are queued per path; the last response of a
 * path is repeated once the queue is down to one entry.
 */

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use ploudos::errors::PanelError;
use ploudos::panel::{Transport, SESSION_COOKIE};

/// Tracks calls so tests can check exactly what was sent
#[derive(Debug, Default)]
pub struct CallTracker {
    /// Paths requested, in order (POST paths included)
    pub calls: Vec<String>,
    /// Form fields of the last POST
    pub last_form: Vec<(String, String)>,
    /// Scripted JSON responses per GET path
    pub responses: HashMap<String, VecDeque<Value>>,
    /// Cookies set on the jar by a login POST
    pub login_cookies: Vec<(String, String)>,
    /// Cookies currently in the jar
    pub jar: Vec<(String, String)>,
    /// Whether close() was called
    pub closed: bool,
}

impl CallTracker {
    /// Number of requests sent to a path
    pub fn count(&self, path: &str) -> usize {
        self.calls.iter().filter(|p| p.as_str() == path).count()
    }
}

/// Mock implementation of the panel transport
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    tracker: Arc<Mutex<CallTracker>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the login POST set the panel's session cookie
    pub fn accepting_login(self) -> Self {
        self.with_login_cookie(SESSION_COOKIE, "session-token")
    }

    /// Make the login POST set an arbitrary cookie
    pub fn with_login_cookie(self, name: &str, value: &str) -> Self {
        self.tracker.lock().unwrap().login_cookies.push((name.to_string(), value.to_string()));
        self
    }

    /// Queue one response for a GET path
    pub fn respond(self, path: &str, body: Value) -> Self {
        self.respond_times(path, body, 1)
    }

    /// Queue the same response `times` times for a GET path
    pub fn respond_times(self, path: &str, body: Value, times: usize) -> Self {
        {
            let mut tracker = self.tracker.lock().unwrap();
            let queue = tracker.responses.entry(path.to_string()).or_default();
            for _ in 0..times {
                queue.push_back(body.clone());
            }
        }
        self
    }

    /// Get the call tracker
    pub fn tracker(&self) -> Arc<Mutex<CallTracker>> {
        self.tracker.clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Result<(), PanelError> {
        let mut tracker = self.tracker.lock().unwrap();
        if tracker.closed {
            return Err(PanelError::SessionClosed);
        }
        tracker.calls.push(path.to_string());
        tracker.last_form = form.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        let cookies = tracker.login_cookies.clone();
        tracker.jar.extend(cookies);
        Ok(())
    }

    async fn get_json(&self, path: &str) -> Result<Value, PanelError> {
        let mut tracker = self.tracker.lock().unwrap();
        if tracker.closed {
            return Err(PanelError::SessionClosed);
        }
        tracker.calls.push(path.to_string());

        let queue = tracker.responses.get_mut(path).ok_or_else(|| PanelError::ApiError {
            status_code: 404,
            message: format!("no scripted response for {}", path),
        })?;

        let body = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };

        body.ok_or_else(|| PanelError::ApiError {
            status_code: 404,
            message: format!("no scripted response for {}", path),
        })
    }

    fn cookie(&self, name: &str) -> Option<String> {
        let tracker = self.tracker.lock().unwrap();
        tracker.jar.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone())
    }

    fn cookie_summary(&self) -> String {
        let tracker = self.tracker.lock().unwrap();
        if tracker.jar.is_empty() {
            return "<none>".to_string();
        }
        tracker.jar.iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn close(&mut self) {
        let mut tracker = self.tracker.lock().unwrap();
        tracker.closed = true;
        tracker.jar.clear();
    }
}
