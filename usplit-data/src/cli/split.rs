use anyhow::Result;
use clap::Args;
use log::info;

use crate::datasplit::{ChunkedSplit, DataSplitType, DataSplitter};

#[derive(Args, Debug)]
pub struct SplitArgs {
    #[arg(short = 'n', long, help = "Number of frames in the stack")]
    pub total: usize,

    #[arg(long, default_value = "0.1")]
    pub val_fraction: f64,

    #[arg(long, default_value = "0.1")]
    pub test_fraction: f64,

    #[arg(long, help = "Put the test frames first (test | val | train)")]
    pub starting_test: bool,

    #[arg(
        short,
        long,
        help = "Also print the frame indexes of this split (all, train, val, test)"
    )]
    pub show: Option<String>,
}

pub fn run(args: &SplitArgs) -> Result<()> {
    let show = args
        .show
        .as_deref()
        .map(str::parse::<DataSplitType>)
        .transpose()?;

    let splitter = ChunkedSplit::new(args.starting_test);
    let indices = splitter.split_indices(args.val_fraction, args.test_fraction, args.total)?;

    info!(
        "val_fraction: {}, test_fraction: {}, starting_test: {}",
        args.val_fraction, args.test_fraction, args.starting_test
    );

    println!("train\t{}", indices.train.len());
    println!("val\t{}", indices.val.len());
    println!("test\t{}", indices.test.len());

    if let Some(split) = show {
        let frames: Vec<usize> = match indices.get(split) {
            Some(idx) => idx.to_vec(),
            None => (0..args.total).collect(),
        };
        let frames: Vec<String> = frames.iter().map(|i| i.to_string()).collect();
        println!("{}\t{}", split, frames.join(","));
    }

    Ok(())
}
