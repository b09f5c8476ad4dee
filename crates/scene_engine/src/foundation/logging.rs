//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system from `RUST_LOG`, defaulting to `info`.
///
/// Calling it more than once is a no-op, so tests and embedding
/// applications may both call it.
pub fn init() {
    init_with_level(log::LevelFilter::Info);
}

/// Initialize the logging system with an explicit default level.
///
/// `RUST_LOG` still overrides the given level when set.
pub fn init_with_level(level: log::LevelFilter) {
    let result = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(level.as_str()),
    )
    .try_init();

    if result.is_ok() {
        log::debug!("Logger initialized at level {level}");
    }
}
