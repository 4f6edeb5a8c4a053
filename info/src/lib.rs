//! Build information shared by the server, the admin routes and the logger.

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The source revision, when the build environment provides one.
pub const REVISION: Option<&str> = option_env!("FEEDBACK_REVISION");

pub const BUILD_TIMESTAMP: Option<&str> = option_env!("FEEDBACK_BUILD_TIMESTAMP");
