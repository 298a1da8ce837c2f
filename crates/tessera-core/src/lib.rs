pub mod config;
pub mod limits;
pub mod session;

pub use config::SessionConfig;
pub use limits::{ResourceChecker, ResourceLimits};
pub use session::{RunSummary, SessionError, TestSession};
