use tracing::subscriber::SetGlobalDefaultError;
use tracing::Level;

/// Installs a compact `tracing` subscriber on stderr.
///
/// `verbosity` counts `-v` flags: 0 → INFO, 1 → DEBUG, 2+ → TRACE.
pub fn init_logging(verbosity: u8) -> Result<(), SetGlobalDefaultError> {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
}
