//! Likelihood through an external empirical noise model.

use std::sync::Arc;

use candle_core::{Result, Tensor};
use candle_nn::{Module, VarBuilder};
use log::info;

use super::{DistrParams, LikelihoodModuleT};
use crate::parameter_net::ParameterNet;

/// An empirical model of sensor noise, queried as a black box.
pub trait NoiseModelT: Send + Sync {
    /// Probability density (not log) of each `observed` entry given the
    /// `predicted` signal; same shape as `observed`
    fn likelihood(&self, observed: &Tensor, predicted: &Tensor) -> Result<Tensor>;
}

/// log p(x | μ) = log noise_model.likelihood(x, μ)
///
/// Non-positive densities from the noise model are not guarded against;
/// they come out as `-inf` or `NaN`.
pub struct NoiseModelLikelihood<N>
where
    N: NoiseModelT,
{
    parameter_net: ParameterNet,
    data_mean: Tensor,
    data_std: Tensor,
    noise_model: Arc<N>,
}

impl<N> NoiseModelLikelihood<N>
where
    N: NoiseModelT,
{
    /// Create a noise-model likelihood module
    ///
    /// * `ch_in` - number of feature channels from the backbone
    /// * `color_channels` - number of predicted image channels
    /// * `data_mean` - normalisation mean (broadcastable to the prediction)
    /// * `data_std` - normalisation std (broadcastable to the prediction)
    /// * `noise_model` - shared, read-only noise model
    /// * `vb` - variable builder; the statistics move to its device
    ///
    pub fn new(
        ch_in: usize,
        color_channels: usize,
        data_mean: &Tensor,
        data_std: &Tensor,
        noise_model: Arc<N>,
        vb: VarBuilder,
    ) -> Result<Self> {
        let device = vb.device().clone();
        let parameter_net =
            ParameterNet::new(ch_in, color_channels, true, vb.pp("parameter_net"))?;

        info!(
            "[NoiseModelLikelihood] channels: {} -> {} on {:?}",
            ch_in, color_channels, device
        );

        Ok(Self {
            parameter_net,
            data_mean: data_mean.to_device(&device)?,
            data_std: data_std.to_device(&device)?,
            noise_model,
        })
    }

    pub fn data_mean(&self) -> &Tensor {
        &self.data_mean
    }

    pub fn data_std(&self) -> &Tensor {
        &self.data_std
    }

    /// Undo the data normalisation: `x * data_std + data_mean`
    pub fn denormalize(&self, x: &Tensor) -> Result<Tensor> {
        x.broadcast_mul(&self.data_std)?
            .broadcast_add(&self.data_mean)
    }
}

impl<N> LikelihoodModuleT for NoiseModelLikelihood<N>
where
    N: NoiseModelT,
{
    fn distr_params(&self, x_nchw: &Tensor) -> Result<DistrParams> {
        Ok(DistrParams {
            mean: self.parameter_net.forward(x_nchw)?,
            logvar: None,
        })
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

    fn logvar(&self, _params: &DistrParams) -> Option<Tensor> {
        None
    }

    fn log_likelihood(&self, x: &Tensor, params: &DistrParams) -> Result<Tensor> {
        self.noise_model.likelihood(x, &params.mean)?.log()
    }
}
