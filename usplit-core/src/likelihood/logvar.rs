use std::fmt;
use std::str::FromStr;

use candle_core::{Result, Tensor};
use serde::{Deserialize, Serialize};

use crate::error::UsplitError;

/// Resolution at which a single log-variance value is shared
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogvarGranularity {
    /// one value per batch item
    Global,
    /// one value per (batch item, channel)
    Channelwise,
    /// no sharing
    Pixelwise,
}

impl FromStr for LogvarGranularity {
    type Err = UsplitError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "global" => Ok(Self::Global),
            "channelwise" => Ok(Self::Channelwise),
            "pixelwise" => Ok(Self::Pixelwise),
            _ => Err(UsplitError::InvalidConfiguration(format!(
                "unsupported predict_logvar: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for LogvarGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Global => "global",
            Self::Channelwise => "channelwise",
            Self::Pixelwise => "pixelwise",
        };
        write!(f, "{}", name)
    }
}

/// Average the raw log-variance down to `granularity`
///
/// The reduced dimensions are kept as singletons, e.g., `(B, C, H, W)`
/// becomes `(B, C, 1, 1)` for `Channelwise` and `(B, 1, 1, 1)` for
/// `Global`, so the result broadcasts against the mean.
///
/// * `lv` - raw log-variance, at least `(B, C)`
///
pub fn aggregate_logvar(lv: &Tensor, granularity: LogvarGranularity) -> Result<Tensor> {
    let dims = lv.dims();

    let keep = match granularity {
        LogvarGranularity::Pixelwise => return Ok(lv.clone()),
        LogvarGranularity::Channelwise => 2,
        LogvarGranularity::Global => 1,
    };

    debug_assert!(dims.len() >= 2);

    let mut new_shape = dims[..keep].to_vec();
    new_shape.resize(dims.len(), 1);

    if lv.elem_count() == 0 {
        return Tensor::zeros(new_shape, lv.dtype(), lv.device());
    }

    let nn: usize = dims[..keep].iter().product();

    lv.reshape((nn, ()))?.mean_keepdim(1)?.reshape(new_shape)
}

/// Elementwise `max(lv, lowerbound)`
pub fn clamp_logvar(lv: &Tensor, lowerbound: f64) -> Result<Tensor> {
    lv.clamp(lowerbound, f64::INFINITY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};

    #[test]
    fn test_channelwise_keeps_batch_and_channel() -> Result<()> {
        let device = Device::Cpu;
        let lv = Tensor::arange(0f32, 24f32, &device)?.reshape((2, 3, 2, 2))?;

        let agg = aggregate_logvar(&lv, LogvarGranularity::Channelwise)?;
        assert_eq!(agg.dims(), &[2, 3, 1, 1]);

        // channel (0, 0) holds 0, 1, 2, 3
        let v: Vec<f32> = agg.flatten_all()?.to_vec1()?;
        assert!((v[0] - 1.5).abs() < 1e-6);
        assert!((v[5] - 21.5).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_pixelwise_is_identity() -> Result<()> {
        let device = Device::Cpu;
        let lv = Tensor::randn(0f32, 1f32, (2, 3, 4, 4), &device)?;
        let agg = aggregate_logvar(&lv, LogvarGranularity::Pixelwise)?;
        assert_eq!(agg.dims(), lv.dims());
        let diff = (agg - &lv)?.abs()?.sum_all()?.to_scalar::<f32>()?;
        assert_eq!(diff, 0.0);
        Ok(())
    }

    #[test]
    fn test_empty_batch() -> Result<()> {
        let device = Device::Cpu;
        let lv = Tensor::zeros((0, 3, 4, 4), DType::F32, &device)?;

        let global = aggregate_logvar(&lv, LogvarGranularity::Global)?;
        assert_eq!(global.dims(), &[0, 1, 1, 1]);

        let channelwise = aggregate_logvar(&lv, LogvarGranularity::Channelwise)?;
        assert_eq!(channelwise.dims(), &[0, 3, 1, 1]);

        let pixelwise = aggregate_logvar(&lv, LogvarGranularity::Pixelwise)?;
        assert_eq!(pixelwise.dims(), &[0, 3, 4, 4]);
        Ok(())
    }

    #[test]
    fn test_clamp_lowerbound() -> Result<()> {
        let device = Device::Cpu;
        let lv = Tensor::new(&[-10f32, -3., 0., 4.], &device)?;
        let v: Vec<f32> = clamp_logvar(&lv, -5.0)?.to_vec1()?;
        assert_eq!(v, vec![-5., -3., 0., 4.]);

        let ones = Tensor::ones(4, DType::F32, &device)?;
        let v: Vec<f32> = clamp_logvar(&ones, 2.0)?.to_vec1()?;
        assert_eq!(v, vec![2.; 4]);
        Ok(())
    }

    #[test]
    fn test_parse_granularity() {
        assert_eq!(
            "Global".parse::<LogvarGranularity>().ok(),
            Some(LogvarGranularity::Global)
        );
        assert!(matches!(
            "framewise".parse::<LogvarGranularity>(),
            Err(UsplitError::InvalidConfiguration(_))
        ));
    }
}
