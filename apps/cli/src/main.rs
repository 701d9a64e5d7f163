//! flowindex CLI: local catalog of automation workflow definitions.
//!
//! Indexes a directory of workflow JSON files into a searchable database
//! and renders step narratives and Mermaid diagrams on demand.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
