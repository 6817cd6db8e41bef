mod app;
mod block_config;
mod event;

pub use app::{AppInfo, InstalledApp};
pub use block_config::BlockConfig;
pub use event::{EventKind, ForegroundEvent};
