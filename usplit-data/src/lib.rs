pub mod cli;
pub mod datasplit;
pub mod multi_channel;

pub use datasplit::{ChunkedSplit, DataSplitType, DataSplitter, SplitIndices};
pub use multi_channel::{
    partition, partition_by_tag, stack_to_tensor, train_val_data, DataConfig, StackLoader,
};
