use std::fmt;
use std::time::Duration;

use log::{debug, error, info, warn};
use serde_json::Value;

use crate::app_config::Config;
use crate::errors::PanelError;
use crate::panel::server_info::{ensure_no_error, ServerInfo};
use crate::panel::transport::HttpTransport;
use crate::panel::Transport;

/// Cookie the panel sets on a successful login
pub const SESSION_COOKIE: &str = "PLOUDOS_SESSION_1";

/// Public PloudOS panel
pub const DEFAULT_BASE_URL: &str = "https://ploudos.com";

const LOGIN_PATH: &str = "/login/";

/// Control endpoints of a managed server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Status,
    Queue,
    Accept,
    Start,
    Stop,
    ExitQueue,
}

impl Endpoint {
    /// Path of this endpoint for the given server
    pub fn path(&self, server_id: u64) -> String {
        let base = format!("/manage/{}/ajax2", server_id);
        match self {
            Self::Status => base,
            Self::Queue => format!("{}/queue/1", base),
            Self::Accept => format!("{}/accept", base),
            Self::Start => format!("{}/start", base),
            Self::Stop => format!("{}/stop", base),
            Self::ExitQueue => format!("{}/exitQueue", base),
        }
    }

    /// Short action name used in logs and errors
    pub fn action(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Queue => "queue",
            Self::Accept => "accept",
            Self::Start => "restart",
            Self::Stop => "stop",
            Self::ExitQueue => "exit queue",
        }
    }
}

/// Pacing and budgets of the polling loops
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollSettings {
    /// Sleep before every status poll
    pub interval: Duration,
    /// Maximum polls while waiting for the queue to finish
    pub queue_timeout: u32,
    /// Maximum polls while waiting for the server to come up after accept/restart
    pub start_timeout: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            queue_timeout: 1500,
            start_timeout: 1500,
        }
    }
}

/// Login state owned by one client
struct Session {
    username: String,
    password: String,
    server_id: u64,
    /// Value of the session cookie captured by the last successful login
    cookie: Option<String>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("server_id", &self.server_id)
            .field("logged_in", &self.cookie.is_some())
            .finish()
    }
}

/// Session-authenticated client for one PloudOS server.
///
/// Every lifecycle operation re-reads the status endpoint; the client keeps no
/// notion of the server's state besides the login cookie. Requests are issued
/// strictly one at a time.
///
/// ```no_run
/// # async fn demo() -> Result<(), ploudos::PanelError> {
/// use ploudos::PanelClient;
///
/// let mut client = PanelClient::new("myusername", "mypassword", 0)?;
/// client.login().await?;
/// if client.can_restart().await? {
///     client.restart().await?;
/// } else if client.queue().await? {
///     client.accept_server().await?;
/// }
/// client.close();
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PanelClient<T: Transport = HttpTransport> {
    transport: T,
    session: Session,
    settings: PollSettings,
}

impl PanelClient<HttpTransport> {
    /// Create a client for the public panel with default polling settings
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        server_id: u64,
    ) -> Result<Self, PanelError> {
        let transport = HttpTransport::new(DEFAULT_BASE_URL, None)?;
        Ok(Self::with_transport(transport, username, password, server_id))
    }

    /// Create a client from the application configuration
    pub fn from_config(config: &Config) -> Result<Self, PanelError> {
        let transport = HttpTransport::new(&config.base_url, config.request_timeout())?;
        Ok(Self::with_transport(
            transport,
            config.credentials.username.clone(),
            config.credentials.password.clone(),
            config.server_id,
        )
        .with_poll_settings(config.polling.settings()))
    }
}

impl<T: Transport> PanelClient<T> {
    /// Create a client on top of an arbitrary transport
    pub fn with_transport(
        transport: T,
        username: impl Into<String>,
        password: impl Into<String>,
        server_id: u64,
    ) -> Self {
        Self {
            transport,
            session: Session {
                username: username.into(),
                password: password.into(),
                server_id,
                cookie: None,
            },
            settings: PollSettings::default(),
        }
    }

    pub fn with_poll_settings(mut self, settings: PollSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_queue_timeout(mut self, polls: u32) -> Self {
        self.settings.queue_timeout = polls;
        self
    }

    pub fn with_start_timeout(mut self, polls: u32) -> Self {
        self.settings.start_timeout = polls;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.settings.interval = interval;
        self
    }

    pub fn server_id(&self) -> u64 {
        self.session.server_id
    }

    pub fn poll_settings(&self) -> &PollSettings {
        &self.settings
    }

    /// Whether `login()` has captured a session cookie
    pub fn is_logged_in(&self) -> bool {
        self.session.cookie.is_some()
    }

    /// Log into the panel with the stored credentials.
    ///
    /// The panel signals success only by setting the session cookie; its absence
    /// is reported as `AuthenticationError` with the jar's content.
    pub async fn login(&mut self) -> Result<(), PanelError> {
        info!("Logging into PloudOS as '{}'", self.session.username);

        let form = [
            ("username", self.session.username.as_str()),
            ("password", self.session.password.as_str()),
        ];
        self.transport.post_form(LOGIN_PATH, &form).await?;

        match self.transport.cookie(SESSION_COOKIE) {
            Some(cookie) => {
                self.session.cookie = Some(cookie);
                info!("Logged into PloudOS");
                Ok(())
            }
            None => {
                self.session.cookie = None;
                Err(PanelError::AuthenticationError {
                    cookies: self.transport.cookie_summary(),
                })
            }
        }
    }

    /// Fetch the current status snapshot of the server
    pub async fn server_info(&self) -> Result<ServerInfo, PanelError> {
        let body = self.request(Endpoint::Status).await?;
        ServerInfo::try_from(body)
    }

    /// Put the server into the start queue and wait for the queue to finish.
    ///
    /// Returns `true` when the panel waits for `accept_server()`, `false` when the
    /// server came up on its own and no accept is needed.
    pub async fn queue(&self) -> Result<bool, PanelError> {
        let body = self.request(Endpoint::Queue).await?;
        self.check_action(Endpoint::Queue, &body)?;
        info!("Server {} queued, waiting for allocation", self.session.server_id);

        for poll in 1..=self.settings.queue_timeout {
            tokio::time::sleep(self.settings.interval).await;
            let info = self.server_info().await?;
            debug!("Queue poll {}/{}: status {:?}", poll, self.settings.queue_timeout, info.status());

            if info.needs_accept() {
                info!("Server {} is waiting for accept", self.session.server_id);
                return Ok(true);
            }
            if info.is_up() {
                info!("Server {} started without needing accept", self.session.server_id);
                return Ok(false);
            }
        }

        Err(PanelError::TimeoutError {
            operation: Endpoint::Queue.action().to_string(),
            polls: self.settings.queue_timeout,
        })
    }

    /// Whether the cheaper `restart()` path is available
    pub async fn can_restart(&self) -> Result<bool, PanelError> {
        Ok(self.server_info().await?.can_restart())
    }

    /// Accept a queued server and wait until it is running.
    ///
    /// Call only after `queue()` returned `true`.
    pub async fn accept_server(&self) -> Result<ServerInfo, PanelError> {
        self.start_and_wait(Endpoint::Accept).await
    }

    /// Start a server that is not fully stopped and wait until it is running.
    ///
    /// This does not stop a running server.
    pub async fn restart(&self) -> Result<ServerInfo, PanelError> {
        self.start_and_wait(Endpoint::Start).await
    }

    /// Ask the panel to stop the server; the raw response is returned unchanged
    pub async fn stop(&self) -> Result<Value, PanelError> {
        info!("Stopping server {}", self.session.server_id);
        self.request(Endpoint::Stop).await
    }

    /// Leave the start queue; the raw response is returned unchanged
    pub async fn exit_queue(&self) -> Result<Value, PanelError> {
        info!("Leaving queue for server {}", self.session.server_id);
        self.request(Endpoint::ExitQueue).await
    }

    /// Release the session. The client cannot be used afterwards.
    pub fn close(mut self) {
        self.session.cookie = None;
        self.transport.close();
    }

    async fn start_and_wait(&self, endpoint: Endpoint) -> Result<ServerInfo, PanelError> {
        let body = self.request(endpoint).await?;
        self.check_action(endpoint, &body)?;
        info!("Server {} {} requested, waiting for it to run", self.session.server_id, endpoint.action());

        for poll in 1..=self.settings.start_timeout {
            tokio::time::sleep(self.settings.interval).await;
            let info = self.server_info().await?;
            debug!(
                "Start poll {}/{}: started {:?}, running {:?}",
                poll,
                self.settings.start_timeout,
                info.is_started(),
                info.is_running()
            );

            if info.is_up() {
                info!("Server {} is running", self.session.server_id);
                return Ok(info);
            }
        }

        Err(PanelError::TimeoutError {
            operation: endpoint.action().to_string(),
            polls: self.settings.start_timeout,
        })
    }

    async fn request(&self, endpoint: Endpoint) -> Result<Value, PanelError> {
        if self.session.cookie.is_none() && endpoint != Endpoint::Status {
            warn!("Sending '{}' without a logged in session", endpoint.action());
        }
        self.transport.get_json(&endpoint.path(self.session.server_id)).await
    }

    fn check_action(&self, endpoint: Endpoint, body: &Value) -> Result<(), PanelError> {
        ensure_no_error(endpoint.action(), body).inspect_err(|e| error!("{}", e))
    }
}
