use env_logger::Env;

/// Configure the global logger from RUST_LOG, defaulting to `info`.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_target(false)
        .try_init();
}
