pub mod split;

use clap::{Parser, Subcommand};

pub use split::SplitArgs;

#[derive(Parser)]
#[command(name = "usplit")]
#[command(about = "Inspect train/val/test partitions of multi-channel image stacks")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show how N frames are split into train/val/test
    Split(SplitArgs),
}
