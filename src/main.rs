//! Recipe Explorer - search TheMealDB recipes from the terminal
//!
//! A text menu application that looks up recipes, caches API responses on
//! disk for offline use and keeps a list of favorite recipes.

use std::io::{self, IsTerminal};
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use recipe_explorer::app::App;
use recipe_explorer::cli::{Cli, StartupConfig};

/// Sets up logging to stderr so the menu on stdout stays readable.
/// `RUST_LOG` takes precedence over the verbosity flags.
fn init_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(2);
        }
    };

    init_logging(config.log_filter());
    tracing::debug!(data_dir = %config.data_dir.display(), "starting");

    println!("Initializing Recipe Explorer...");
    let styled = io::stdout().is_terminal();
    let mut app = App::new(&config, io::stdin().lock(), io::stdout()).with_styling(styled);
    if let Err(e) = app.initialize() {
        eprintln!("Failed to initialize: {}", e);
        process::exit(1);
    }

    app.run().await?;
    Ok(())
}
