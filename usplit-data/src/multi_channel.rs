use std::path::Path;

use log::info;
use ndarray::{Array4, ArrayView4, Axis};
use num_traits::AsPrimitive;
use serde::{Deserialize, Serialize};
use usplit_core::candle_core::{Device, Tensor};
use usplit_core::{Result, UsplitError};

use crate::datasplit::{DataSplitType, DataSplitter};

/// The three channels to pull out of a multi-channel stack
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataConfig {
    pub channel_1: usize,
    pub channel_2: usize,
    pub channel_3: usize,
}

impl DataConfig {
    pub fn channels(&self) -> [usize; 3] {
        [self.channel_1, self.channel_2, self.channel_3]
    }
}

/// Read an `(N, H, W, C)` stack from a file
pub trait StackLoader {
    type Elem: Copy + AsPrimitive<f32>;

    fn load(&self, path: &Path) -> anyhow::Result<Array4<Self::Elem>>;
}

///
/// Select `channels` (in that order) along the last axis and return the
/// requested split as `f32`.
///
/// * `data` - raw stack `(N, H, W, C)`
/// * `channels` - three channel indexes, each `< C`
/// * `split` - `All` returns every frame; otherwise the frames of that partition
/// * `val_fraction`, `test_fraction` - only used when `split` is not `All`
/// * `splitter` - generates the train/val/test frame indexes
///
pub fn partition<T, S>(
    data: ArrayView4<T>,
    channels: [usize; 3],
    split: DataSplitType,
    val_fraction: f64,
    test_fraction: f64,
    splitter: &S,
) -> Result<Array4<f32>>
where
    T: Copy + AsPrimitive<f32>,
    S: DataSplitter + ?Sized,
{
    let available = data.len_of(Axis(3));

    if channels.iter().any(|&c| c >= available) {
        return Err(UsplitError::InvalidChannelSelection {
            channels,
            available,
        });
    }

    let selected = data.select(Axis(3), &channels);

    let selected = match split {
        DataSplitType::All => selected,
        _ => {
            let ntot = selected.len_of(Axis(0));
            let indices = splitter.split_indices(val_fraction, test_fraction, ntot)?;
            let rows = indices.get(split).unwrap_or_default();
            selected.select(Axis(0), rows)
        }
    };

    Ok(selected.mapv(|x| x.as_()))
}

/// [`partition`] with the split given as a tag (`all`, `train`, `val`,
/// `test`); an unknown tag fails before touching the data
pub fn partition_by_tag<T, S>(
    data: ArrayView4<T>,
    channels: [usize; 3],
    split_tag: &str,
    val_fraction: f64,
    test_fraction: f64,
    splitter: &S,
) -> Result<Array4<f32>>
where
    T: Copy + AsPrimitive<f32>,
    S: DataSplitter + ?Sized,
{
    let split: DataSplitType = split_tag.parse()?;
    partition(data, channels, split, val_fraction, test_fraction, splitter)
}

/// Load a stack with `loader` and [`partition`] it
pub fn train_val_data<L, S>(
    path: &Path,
    data_config: &DataConfig,
    split: DataSplitType,
    val_fraction: f64,
    test_fraction: f64,
    loader: &L,
    splitter: &S,
) -> anyhow::Result<Array4<f32>>
where
    L: StackLoader + ?Sized,
    S: DataSplitter + ?Sized,
{
    let [c1, c2, c3] = data_config.channels();
    info!(
        "Loading {:?} with Channels {},{},{}, datasplit mode:{}",
        path, c1, c2, c3, split
    );

    let data = loader.load(path)?;
    let ret = partition(
        data.view(),
        data_config.channels(),
        split,
        val_fraction,
        test_fraction,
        splitter,
    )?;

    info!("{} frames of shape {:?}", split, ret.shape());
    Ok(ret)
}

/// `(N, H, W, C)` stack to an `(N, C, H, W)` tensor on `device`
pub fn stack_to_tensor(data: &Array4<f32>, device: &Device) -> Result<Tensor> {
    let (nn, hh, ww, cc) = data.dim();
    let values: Vec<f32> = data.iter().copied().collect();
    Ok(Tensor::from_vec(values, (nn, hh, ww, cc), device)?
        .permute((0, 3, 1, 2))?
        .contiguous()?)
}
