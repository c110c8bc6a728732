use std::collections::HashSet;
use std::path::Path;

use approx::assert_abs_diff_eq;
use ndarray::{Array4, Axis};
use usplit_core::candle_core::Device;
use usplit_core::UsplitError;
use usplit_data::*;

/// (n, h, w, c) stack where each entry encodes its frame and channel
fn synthetic_stack(n: usize, h: usize, w: usize, c: usize) -> Array4<u16> {
    Array4::from_shape_fn((n, h, w, c), |(i, _, _, k)| (100 * i + k) as u16)
}

#[test]
fn all_selects_channels_as_f32() {
    let data = synthetic_stack(10, 8, 8, 4);
    let splitter = ChunkedSplit::default();

    let out = partition(data.view(), [0, 1, 2], DataSplitType::All, 0.0, 0.0, &splitter)
        .expect("valid channels");

    assert_eq!(out.shape(), &[10, 8, 8, 3]);
    assert_abs_diff_eq!(out[[3, 0, 0, 2]], 302.0_f32);
}

#[test]
fn channel_order_is_preserved() {
    let data = synthetic_stack(2, 2, 2, 4);
    let splitter = ChunkedSplit::default();

    let out = partition(data.view(), [3, 0, 2], DataSplitType::All, 0.0, 0.0, &splitter)
        .expect("valid channels");

    let first = out.index_axis(Axis(0), 1);
    assert_eq!(first[[0, 0, 0]], 103.0);
    assert_eq!(first[[0, 0, 1]], 100.0);
    assert_eq!(first[[0, 0, 2]], 102.0);
}

#[test]
fn partitions_are_disjoint() {
    let data = synthetic_stack(10, 8, 8, 4);
    let splitter = ChunkedSplit::default();

    let mut seen = HashSet::new();
    let mut total = 0;

    for split in [DataSplitType::Train, DataSplitType::Val, DataSplitType::Test] {
        let out = partition(data.view(), [0, 1, 2], split, 0.2, 0.2, &splitter)
            .expect("valid partition");
        assert!(out.len_of(Axis(0)) > 0, "{} is empty", split);
        total += out.len_of(Axis(0));

        for frame in out.axis_iter(Axis(0)) {
            let frame_id = (frame[[0, 0, 0]] / 100.0) as usize;
            assert!(seen.insert(frame_id), "frame {} in two partitions", frame_id);
        }
    }

    assert!(total <= 10);
}

#[test]
fn split_indices_stay_in_range() {
    for starting_test in [false, true] {
        let splitter = ChunkedSplit::new(starting_test);
        for n in [0, 1, 7, 10, 33] {
            let idx = splitter.split_indices(0.15, 0.25, n).expect("valid fractions");
            let all: HashSet<usize> = idx
                .train
                .iter()
                .chain(&idx.val)
                .chain(&idx.test)
                .copied()
                .collect();
            assert_eq!(all.len(), idx.size());
            assert!(idx.size() <= n);
            assert!(all.iter().all(|&i| i < n));
        }
    }
}

#[test]
fn out_of_range_channel_fails() {
    let data = synthetic_stack(10, 8, 8, 4);
    let splitter = ChunkedSplit::default();

    let err = partition(data.view(), [4, 1, 2], DataSplitType::All, 0.0, 0.0, &splitter)
        .expect_err("channel 4 does not exist");

    assert!(matches!(
        err,
        UsplitError::InvalidChannelSelection { available: 4, .. }
    ));
}

#[test]
fn unknown_split_tag_fails() {
    let data = synthetic_stack(10, 8, 8, 4);
    let splitter = ChunkedSplit::default();

    let ret = partition_by_tag(data.view(), [0, 1, 2], "holdout", 0.1, 0.1, &splitter);
    assert!(matches!(ret, Err(UsplitError::InvalidSplitKind(tag)) if tag == "holdout"));

    let ok = partition_by_tag(data.view(), [0, 1, 2], "val", 0.1, 0.1, &splitter)
        .expect("known tag");
    assert_eq!(ok.len_of(Axis(0)), 1);
}

struct InMemoryLoader(Array4<u16>);

impl StackLoader for InMemoryLoader {
    type Elem = u16;

    fn load(&self, _path: &Path) -> anyhow::Result<Array4<u16>> {
        Ok(self.0.clone())
    }
}

#[test]
fn train_val_data_uses_config_channels() -> anyhow::Result<()> {
    let loader = InMemoryLoader(synthetic_stack(20, 4, 4, 5));
    let config: DataConfig =
        serde_json::from_str(r#"{"channel_1": 4, "channel_2": 1, "channel_3": 0}"#)?;

    let train = train_val_data(
        Path::new("stack.tif"),
        &config,
        DataSplitType::Train,
        0.2,
        0.2,
        &loader,
        &ChunkedSplit::default(),
    )?;

    // val/test take frames 0..8
    assert_eq!(train.shape(), &[12, 4, 4, 3]);
    assert_eq!(train[[0, 0, 0, 0]], 804.0);
    assert_eq!(train[[0, 0, 0, 1]], 801.0);
    assert_eq!(train[[0, 0, 0, 2]], 800.0);
    Ok(())
}

#[test]
fn stack_to_tensor_is_channel_first() -> anyhow::Result<()> {
    let data = synthetic_stack(3, 2, 5, 4);
    let splitter = ChunkedSplit::default();
    let stack = partition(data.view(), [0, 1, 3], DataSplitType::All, 0.0, 0.0, &splitter)?;

    let x = stack_to_tensor(&stack, &Device::Cpu)?;
    assert_eq!(x.dims(), &[3, 3, 2, 5]);

    let v = x.get(2)?.get(2)?.get(1)?.get(4)?.to_scalar::<f32>()?;
    assert_abs_diff_eq!(v, 203.0);
    Ok(())
}
