//! Logging initialization

/// Initialize the logging system
///
/// Uses env_logger with default filter level of `info`.
/// Override with RUST_LOG environment variable (e.g. `RUST_LOG=matvar=debug`
/// to see attach/update decisions).
///
/// # Example
/// ```no_run
/// matvar::core::logging::init();
/// log::info!("Material variation tooling started");
/// ```
pub fn init() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    )
    .format_timestamp_millis()
    .init();
}
