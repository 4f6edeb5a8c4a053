use std::sync::Mutex;

use slog::Drain;
use slog::Fuse;
use slog_async::Async;
use slog_json::Json;

pub use slog::{debug, error, info, o, trace, warn, Logger};

pub fn initialize_logger(component: &'static str) -> Logger {
    let json = Json::new(std::io::stderr()).add_default_keys().set_newlines(true).build();
    let drain = Mutex::new(json).map(Fuse);

    #[cfg(feature = "env_logging")]
    let drain = slog_envlogger::new(drain);

    let drain = Async::new(drain).thread_name(component.to_owned()).build().fuse();

    Logger::root(
        drain,
        o!(
            "component" => component,
            "version" => info::VERSION,
            "revision" => info::REVISION,
            "build_timestamp" => info::BUILD_TIMESTAMP,
        ),
    )
}

pub fn discard_logger() -> Logger {
    Logger::root(slog::Discard, o!())
}
