// Entrypoint for the CLI application.
// - Keeps `main` small: set up logging, read config, hand off to the UI loop.
// - Returns `anyhow::Result` to simplify error handling at the top level.

use salon_hair_cli::{config::AppConfig, ui::main_menu};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Logs go to stderr and default to `warn` so they don't clutter the
    // prompts. Use RUST_LOG=info (or debug) to see each request.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    // Reads `.env` and the environment (SWAP_API_URL, PINATA_*, TEMP).
    let cfg = AppConfig::from_env();
    tracing::info!("Starting salon-hair with config: {:?}", cfg);

    // Start the interactive menu. This call blocks until the user exits.
    main_menu(cfg)?;
    Ok(())
}
