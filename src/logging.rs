use env_logger::Env;

/// Initialise `env_logger` from `RUST_LOG`, defaulting to `info`. Safe to call twice.
pub fn init_logging_from_env() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .try_init();
}
