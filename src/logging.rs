use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global `tracing` subscriber for the binaries. Output goes to
/// stderr so it stays apart from CLI output.
///
/// The filter comes from `RUST_LOG` and defaults to `info`, for example
/// `RUST_LOG=household_scheduler=debug`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Debug-level subscriber routed through the test writer. Safe to call from
/// every test.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
