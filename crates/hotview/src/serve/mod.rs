//! Static file server with live reload.
//!
//! - [`resolver`] maps request paths to serving targets
//! - [`negotiate`] decides between full, partial, 304 and 416 responses
//! - [`responder`] streams files and patches HTML through [`inject`]
//! - [`broadcaster`] and [`watcher`] push reloads to open browser tabs
//! - [`server`] wires it all into an axum router

pub mod broadcaster;
pub mod config;
pub mod error_page;
pub mod inject;
pub mod listing;
pub mod negotiate;
pub mod resolver;
pub mod responder;
pub mod server;
pub mod watcher;

pub use broadcaster::{ChangeBroadcaster, ReloadDebouncer, SharedBroadcaster, Subscription};
pub use config::{ServeConfig, SinglePage, SingleSetting, DEBOUNCE_WINDOW};
pub use resolver::{resolve, ResolvedTarget};
pub use server::{build_router, ServerState, SharedState};
pub use watcher::{FileChange, FileWatcher};
