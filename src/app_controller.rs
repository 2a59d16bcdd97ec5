use anyhow::{Context, Result};
use log::info;

use crate::app_config::Config;
use crate::panel::{HttpTransport, PanelClient, ServerInfo, Transport};

// @module: Application controller for server lifecycle commands

/// How `ensure_running` brought the server up
#[derive(Debug, Clone, PartialEq)]
pub enum StartOutcome {
    /// Server was already started and running, nothing was sent
    AlreadyRunning(ServerInfo),
    /// Fast path through `restart()`
    Restarted(ServerInfo),
    /// Full queue then accept sequence
    Accepted(ServerInfo),
    /// Queue finished with the server already running, accept was skipped
    StartedWithoutAccept(ServerInfo),
}

impl StartOutcome {
    /// Final status snapshot
    pub fn info(&self) -> &ServerInfo {
        match self {
            Self::AlreadyRunning(info)
            | Self::Restarted(info)
            | Self::Accepted(info)
            | Self::StartedWithoutAccept(info) => info,
        }
    }
}

/// Drives the panel client for the command line
pub struct Controller<T: Transport = HttpTransport> {
    // @field: Logged in panel client
    client: PanelClient<T>,
}

impl Controller<HttpTransport> {
    // @method: Create a controller and log in with the given configuration
    pub async fn connect(config: &Config) -> Result<Self> {
        let client = PanelClient::from_config(config)
            .context("Failed to create PloudOS client")?;
        let mut controller = Self::new(client);
        controller.login().await?;
        Ok(controller)
    }
}

impl<T: Transport> Controller<T> {
    pub fn new(client: PanelClient<T>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &PanelClient<T> {
        &self.client
    }

    pub async fn login(&mut self) -> Result<()> {
        self.client.login().await.context("Login failed")
    }

    /// Bring the server up through whichever path the panel currently allows
    pub async fn ensure_running(&self) -> Result<StartOutcome> {
        let info = self.client.server_info().await
            .context("Failed to read server status")?;
        if info.is_up() {
            info!("Server {} is already running", self.client.server_id());
            return Ok(StartOutcome::AlreadyRunning(info));
        }

        if self.client.can_restart().await? {
            let info = self.client.restart().await.context("Restart failed")?;
            return Ok(StartOutcome::Restarted(info));
        }

        if self.client.queue().await.context("Queueing failed")? {
            let info = self.client.accept_server().await.context("Accept failed")?;
            Ok(StartOutcome::Accepted(info))
        } else {
            let info = self.client.server_info().await?;
            Ok(StartOutcome::StartedWithoutAccept(info))
        }
    }

    // @method: Release the session
    pub fn shutdown(self) {
        self.client.close();
    }
}
