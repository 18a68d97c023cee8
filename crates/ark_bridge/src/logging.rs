//! Tracing subscriber for the bridge.
//!
//! Every crate in the workspace logs through `tracing` only; the subscriber
//! below is the single place output is configured. Operators pick the level
//! in `[logging]` or with `--log-level`, and `RUST_LOG` overrides both so a
//! single target such as `bridge_server::messaging` can be turned up while
//! chasing a stuck RCON command.

use crate::config::LoggingSettings;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber for the bridge process.
///
/// JSON lines are written when either `[logging] json_format` or the
/// `--json-logs` flag asks for them, which suits log shippers next to the
/// game server. Otherwise output is coloured text. Both formats tag lines
/// with the worker thread, which is how per-client lanes and the shutdown
/// timeline are told apart.
///
/// Fails if the embedding program already installed a subscriber.
pub fn setup_logging(
    config: &LoggingSettings,
    json_format: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = config.level.as_str();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));
    let use_json = json_format || config.json_format;

    let registry = tracing_subscriber::registry().with(filter);
    let layer = fmt::layer()
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(true)
        .with_thread_names(true);

    if use_json {
        registry.with(layer.json()).try_init()?;
    } else {
        registry.with(layer.with_ansi(true)).try_init()?;
    }

    info!("🔧 Bridge logging ready (level: {}, json: {})", log_level, use_json);
    Ok(())
}

/// Logs the bridge banner with the crate version.
pub fn display_banner() {
    let version = option_env!("CARGO_PKG_VERSION").unwrap_or("UNK");
    info!("╔══════════════════════════════════════════╗");
    info!("║           🦖 ARK RCON BRIDGE 🦖          ║");
    info!("║                 v{:<10}              ║", version);
    info!("║                                          ║");
    info!("║  🌐 WebSocket clients                    ║");
    info!("║  🎮 arkCommand:: forwarded to RCON       ║");
    info!("║  🛠️  sysCommand:: reconnect / shutdown    ║");
    info!("║  📡 Live upstream connection status      ║");
    info!("║                                          ║");
    info!("╚══════════════════════════════════════════╝");
}
