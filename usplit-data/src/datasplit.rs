use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use usplit_core::{Result, UsplitError};

/// Which subset of a stack to hand out
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSplitType {
    All,
    Train,
    Val,
    Test,
}

impl DataSplitType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Train => "Train",
            Self::Val => "Val",
            Self::Test => "Test",
        }
    }
}

impl fmt::Display for DataSplitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for DataSplitType {
    type Err = UsplitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "train" => Ok(Self::Train),
            "val" => Ok(Self::Val),
            "test" => Ok(Self::Test),
            _ => Err(UsplitError::InvalidSplitKind(s.to_string())),
        }
    }
}

/// Integer codes: All = 0, Train = 1, Val = 2, Test = 3
impl TryFrom<i64> for DataSplitType {
    type Error = UsplitError;

    fn try_from(code: i64) -> Result<Self> {
        match code {
            0 => Ok(Self::All),
            1 => Ok(Self::Train),
            2 => Ok(Self::Val),
            3 => Ok(Self::Test),
            _ => Err(UsplitError::InvalidSplitKind(code.to_string())),
        }
    }
}

/// Disjoint sample indexes within `[0, n)`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub val: Vec<usize>,
    pub test: Vec<usize>,
}

impl SplitIndices {
    /// Indexes of one partition; `None` for `All`
    pub fn get(&self, split: DataSplitType) -> Option<&[usize]> {
        match split {
            DataSplitType::All => None,
            DataSplitType::Train => Some(&self.train),
            DataSplitType::Val => Some(&self.val),
            DataSplitType::Test => Some(&self.test),
        }
    }

    pub fn size(&self) -> usize {
        self.train.len() + self.val.len() + self.test.len()
    }
}

/// Turn `(val_fraction, test_fraction, n)` into index partitions
pub trait DataSplitter {
    fn split_indices(&self, val_fraction: f64, test_fraction: f64, n: usize)
        -> Result<SplitIndices>;
}

///
/// Deterministic split without shuffling.
///
/// With `starting_test` the stack is laid out as `test | val | train`.
/// Otherwise the first `⌊(val + test) n⌋` frames are cut into chunks of
/// `max(1, min(3, tv / 2))` frames that alternate val, test, val, ...;
/// the remaining frames are train. A remainder shorter than a chunk goes
/// to whichever of val/test is next in turn.
///
#[derive(Clone, Copy, Debug, Default)]
pub struct ChunkedSplit {
    pub starting_test: bool,
}

impl ChunkedSplit {
    pub fn new(starting_test: bool) -> Self {
        Self { starting_test }
    }
}

fn check_fractions(val_fraction: f64, test_fraction: f64) -> Result<()> {
    let valid = |x: f64| (0.0..=1.0).contains(&x);
    if !valid(val_fraction) || !valid(test_fraction) || val_fraction + test_fraction > 1.0 {
        return Err(UsplitError::InvalidConfiguration(format!(
            "val_fraction {} and test_fraction {} must be in [0, 1] with sum <= 1",
            val_fraction, test_fraction
        )));
    }
    Ok(())
}

impl DataSplitter for ChunkedSplit {
    fn split_indices(
        &self,
        val_fraction: f64,
        test_fraction: f64,
        n: usize,
    ) -> Result<SplitIndices> {
        check_fractions(val_fraction, test_fraction)?;

        let ntot = n as f64;

        if self.starting_test {
            let ntest = (ntot * test_fraction).floor() as usize;
            let nval = ((ntot * val_fraction).floor() as usize).min(n - ntest);
            return Ok(SplitIndices {
                test: (0..ntest).collect(),
                val: (ntest..(ntest + nval)).collect(),
                train: ((ntest + nval)..n).collect(),
            });
        }

        let tv = (((val_fraction + test_fraction) * ntot).floor() as usize).min(n);

        let mut ret = SplitIndices {
            train: (tv..n).collect(),
            ..Default::default()
        };

        if tv == 0 {
            return Ok(ret);
        }

        let chunk_size = (tv / 2).clamp(1, 3);
        let nchunks = tv / chunk_size;

        for b in 0..nchunks {
            let (lb, ub) = (b * chunk_size, (b + 1) * chunk_size);
            if b % 2 == 0 {
                ret.val.extend(lb..ub);
            } else {
                ret.test.extend(lb..ub);
            }
        }

        let rest = (nchunks * chunk_size)..tv;
        if nchunks % 2 == 0 {
            ret.val.extend(rest);
        } else {
            ret.test.extend(rest);
        }

        Ok(ret)
    }
}
