/*!
 * # ploudos - unofficial PloudOS client
 *
 * An async Rust client for the PloudOS game-server hosting panel.
 *
 * ## Features
 *
 * - Log in with username/password and keep the session cookie
 * - Read the server status snapshot
 * - Start a server from scratch (queue, then accept) or restart it
 * - Stop a server or leave the start queue
 * - Bounded polling loops with configurable pacing
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `app_controller`: Lifecycle orchestration used by the command line
 * - `panel`: Panel client:
 *   - `panel::client`: Session client and polling operations
 *   - `panel::server_info`: Status snapshot view
 *   - `panel::transport`: reqwest transport with cookie jar
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod panel;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, StartOutcome};
pub use errors::PanelError;
pub use panel::{PanelClient, ServerInfo};
