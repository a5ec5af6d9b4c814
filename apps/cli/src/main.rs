//! orgdocs CLI: documentation prompts for Salesforce DX projects.
//!
//! Lists project-owned flows, Apex, Lightning pages and web components, and
//! resolves the prompts a text-generation client turns into documentation.

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
