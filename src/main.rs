use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use spdash::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for spdash::AppCommand {
    fn from(cmd: Commands) -> spdash::AppCommand {
        match cmd {
            Commands::List { sector, symbol } => spdash::AppCommand::List { sector, symbol },
            Commands::Sectors => spdash::AppCommand::Sectors,
            Commands::Show { symbol } => spdash::AppCommand::Show { symbol },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display the constituent list, optionally narrowed
    List {
        /// Restrict to one GICS sector ("all" for no restriction)
        #[arg(long)]
        sector: Option<String>,

        /// Restrict to one symbol ("all" for no restriction)
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Display the distinct sectors with constituent counts
    Sectors,
    /// Display a year of price history and statistics for one symbol
    Show {
        /// Constituent symbol, e.g. AAPL
        symbol: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => spdash::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

fn setup() -> anyhow::Result<()> {
    use anyhow::Context;

    let path = spdash::config::AppConfig::default_config_path()?;

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let default_config = r#"---
providers:
  wiki:
    base_url: "https://en.wikipedia.org"
  yahoo:
    base_url: "https://query1.finance.yahoo.com"
"#;

    std::fs::write(&path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
