use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

/// Start console logging on stderr.
///
/// The filter comes from `RUST_LOG`, defaulting to `info`.
pub fn init() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = fmt::layer()
        .with_ansi(!cfg!(windows))
        .with_target(false)
        .with_writer(std::io::stderr);

    let collector = tracing_subscriber::registry()
        .with(console_layer)
        .with(filter);
    tracing::subscriber::set_global_default(collector)?;

    let log_var = if let Ok(var) = std::env::var("RUST_LOG") {
        format!(" with RUST_LOG=\"{}\".", var)
    } else {
        ".".to_string()
    };
    tracing::debug!("Logging initiated to console{log_var}");

    Ok(())
}
