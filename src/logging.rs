use tracing_subscriber::EnvFilter;

/// Pick the log filter: `RUST_LOG` wins, then `-v` count, then the
/// configured level, then `warn`.
pub fn filter_directive(env: Option<&str>, verbosity: u8, configured: Option<&str>) -> String {
    if let Some(env) = env.filter(|s| !s.trim().is_empty()) {
        return env.to_string();
    }
    match verbosity {
        0 => configured.unwrap_or("warn").to_string(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Install the global subscriber, writing to stderr. Safe to call twice.
pub fn init(verbosity: u8, configured: Option<&str>) {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = filter_directive(env.as_deref(), verbosity, configured);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
