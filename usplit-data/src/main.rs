use anyhow::Result;
use clap::Parser;
use usplit_data::cli::{split, Cli, Commands};

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Split(args) => {
            split::run(args)?;
        }
    }

    Ok(())
}
