use clap::Parser;
use api_guard::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;

    match cli.command {
        Command::Serve => cli::serve::run(config).await,
        Command::CheckConfig => cli::check_config::run(config),
    }
}
