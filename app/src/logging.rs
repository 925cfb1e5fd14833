use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber, `RUST_LOG` overrides the info default
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if cfg!(test) {
        let _ = builder.compact().with_test_writer().try_init();
    } else {
        let _ = builder.with_target(false).try_init();
    }
}
