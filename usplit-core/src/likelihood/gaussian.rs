//! Gaussian likelihood with optional log-variance prediction.

use candle_core::{Result, Tensor};
use candle_nn::{Module, VarBuilder};
use log::info;
use serde::{Deserialize, Serialize};

use super::logvar::{aggregate_logvar, clamp_logvar, LogvarGranularity};
use super::{DistrParams, LikelihoodModuleT};
use crate::parameter_net::ParameterNet;

fn default_conv2d_bias() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GaussianLikelihoodConfig {
    /// `None`: mean only, scored by `-0.5 (mean - x)^2`
    #[serde(default)]
    pub predict_logvar: Option<LogvarGranularity>,
    /// lower bound applied to the aggregated logvar
    #[serde(default)]
    pub logvar_lowerbound: Option<f64>,
    #[serde(default = "default_conv2d_bias")]
    pub conv2d_bias: bool,
}

impl Default for GaussianLikelihoodConfig {
    fn default() -> Self {
        Self {
            predict_logvar: None,
            logvar_lowerbound: None,
            conv2d_bias: true,
        }
    }
}

/// Gaussian likelihood: x ~ N(μ, exp(lv))
///
/// # Model
/// ```text
/// with logvar:    log p(x | μ, lv) = -0.5 * [(x - μ)² / exp(lv) + lv + log(2π)]
/// without logvar: log p(x | μ)     = -0.5 * (μ - x)²
/// ```
///
/// The second form is an unnormalised score, not a density; downstream
/// loss scaling relies on it as is.
pub struct GaussianLikelihood {
    parameter_net: ParameterNet,
    color_channels: usize,
    predict_logvar: Option<LogvarGranularity>,
    logvar_lowerbound: Option<f64>,
}

impl GaussianLikelihood {
    /// Create a Gaussian likelihood module
    ///
    /// * `ch_in` - number of feature channels from the backbone
    /// * `color_channels` - number of predicted image channels
    /// * `config` - logvar granularity, lower bound, bias
    /// * `vb` - variable builder; its device is where the module lives
    ///
    pub fn new(
        ch_in: usize,
        color_channels: usize,
        config: &GaussianLikelihoodConfig,
        vb: VarBuilder,
    ) -> Result<Self> {
        let logvar_ch_needed = config.predict_logvar.is_some() as usize;

        let parameter_net = ParameterNet::new(
            ch_in,
            color_channels * (1 + logvar_ch_needed),
            config.conv2d_bias,
            vb.pp("parameter_net"),
        )?;

        info!(
            "[GaussianLikelihood] PredLVar:{} LowBLVar:{}",
            config
                .predict_logvar
                .map(|g| g.to_string())
                .unwrap_or("none".to_string()),
            config
                .logvar_lowerbound
                .map(|b| b.to_string())
                .unwrap_or("none".to_string()),
        );

        Ok(Self {
            parameter_net,
            color_channels,
            predict_logvar: config.predict_logvar,
            logvar_lowerbound: config.logvar_lowerbound,
        })
    }

    pub fn predict_logvar(&self) -> Option<LogvarGranularity> {
        self.predict_logvar
    }

    pub fn logvar_lowerbound(&self) -> Option<f64> {
        self.logvar_lowerbound
    }

    pub fn color_channels(&self) -> usize {
        self.color_channels
    }

    /// Split the network output into mean and the aggregated, clamped
    /// logvar
    fn get_mean_lv(&self, x_nchw: &Tensor) -> Result<(Tensor, Option<Tensor>)> {
        let out = self.parameter_net.forward(x_nchw)?;

        let Some(granularity) = self.predict_logvar else {
            return Ok((out, None));
        };

        // first half mean, second half logvar
        let cc = self.color_channels;
        let mean = out.narrow(1, 0, cc)?;
        let lv = out.narrow(1, cc, cc)?;

        let lv = aggregate_logvar(&lv, granularity)?;

        let lv = match self.logvar_lowerbound {
            Some(lb) => clamp_logvar(&lv, lb)?,
            None => lv,
        };

        Ok((mean, Some(lv)))
    }
}

impl LikelihoodModuleT for GaussianLikelihood {
    fn distr_params(&self, x_nchw: &Tensor) -> Result<DistrParams> {
        let (mean, logvar) = self.get_mean_lv(x_nchw)?;
        Ok(DistrParams { mean, logvar })
    }

    fn mean(&self, params: &DistrParams) -> Tensor {
        params.mean.clone()
    }

    fn mode(&self, params: &DistrParams) -> Tensor {
        params.mean.clone()
    }

    fn sample(&self, params: &DistrParams) -> Tensor {
        params.mean.clone()
    }

    fn logvar(&self, params: &DistrParams) -> Option<Tensor> {
        params.logvar.clone()
    }

    fn log_likelihood(&self, x: &Tensor, params: &DistrParams) -> Result<Tensor> {
        match (&self.predict_logvar, &params.logvar) {
            (Some(_), Some(logvar)) => log_normal(x, &params.mean, logvar),
            (Some(_), None) => Err(candle_core::Error::Msg(
                "GaussianLikelihood predicts logvar but params carry none".into(),
            )),
            (None, _) => params.mean.broadcast_sub(x)?.sqr()? * (-0.5),
        }
    }
}

/// Log-density of `x` under N(mean, exp(logvar))
///
/// ```text
/// -0.5 * [(x - mean)² / exp(logvar) + logvar + log(2π)]
/// ```
///
/// * `x` - points, `(B, C, H, W)`
/// * `mean` - same shape as `x`
/// * `logvar` - broadcastable to `x`, e.g., `(B, 1, 1, 1)`
///
pub fn log_normal(x: &Tensor, mean: &Tensor, logvar: &Tensor) -> Result<Tensor> {
    let ln_2pi: f64 = (2.0 * std::f64::consts::PI).ln();

    let var = logvar.exp()?;
    let diff_sq = x.broadcast_sub(mean)?.sqr()?;
    let scaled_diff_sq = diff_sq.broadcast_div(&var)?;

    (scaled_diff_sq.broadcast_add(logvar)? + ln_2pi)? * (-0.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};

    #[test]
    fn test_log_normal_at_mean() -> Result<()> {
        let device = Device::Cpu;
        let x = Tensor::new(&[0.5f32, -1.0, 2.0], &device)?;
        let lv = Tensor::new(&[0f32, 1.0, -2.0], &device)?;

        let ll: Vec<f32> = log_normal(&x, &x, &lv)?.to_vec1()?;
        let ln_2pi = (2.0 * std::f32::consts::PI).ln();

        for (l, v) in ll.iter().zip([0f32, 1.0, -2.0]) {
            assert!((l - (-0.5 * (v + ln_2pi))).abs() < 1e-5);
        }
        Ok(())
    }

    #[test]
    fn test_log_normal_broadcast_logvar() -> Result<()> {
        let device = Device::Cpu;
        let x = Tensor::zeros((2, 3, 4, 4), DType::F32, &device)?;
        let mean = Tensor::ones((2, 3, 4, 4), DType::F32, &device)?;
        let lv = Tensor::zeros((2, 1, 1, 1), DType::F32, &device)?;

        let ll = log_normal(&x, &mean, &lv)?;
        assert_eq!(ll.dims(), &[2, 3, 4, 4]);
        Ok(())
    }
}
