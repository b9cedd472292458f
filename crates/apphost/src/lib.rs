pub mod server;

pub mod apps;
pub mod config;
pub mod error;
pub mod fetch;
pub mod host;
pub mod logging;

pub use crate::apps::{AppRecord, AppRegistry};
pub use crate::config::HostConfig;
pub use crate::error::{CoreError, CoreResult};
pub use crate::host::AppHost;
pub use crate::server::Server;
