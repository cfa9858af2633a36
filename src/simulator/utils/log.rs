use env_logger::{Builder, Env};

/// Initialise the global logger once. `RUST_LOG` wins over the default level;
/// quiet runs only show warnings. Later calls are no-ops.
pub fn init_log(quiet: bool) {
  let level = if quiet { "warn" } else { "info" };
  let _ = Builder::from_env(Env::default().default_filter_or(level))
    .format_timestamp(None)
    .format_target(false)
    .try_init();
}
