//! CLI entry point for gir-typegen.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

/// gir-typegen — generate TypeScript FFI bindings from GIR metadata.
#[derive(Parser, Debug)]
#[command(name = "gir-typegen", version, about)]
struct Cli {
    /// Path to the gir-typegen.toml configuration file.
    #[arg(default_value = "gir-typegen.toml")]
    config: PathBuf,

    /// Output directory (overrides config).
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("gir_typegen=info")),
        )
        .init();

    let cli = Cli::parse();
    gir_typegen::run(&cli.config, cli.output.as_deref())?;
    Ok(())
}
