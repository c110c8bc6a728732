//! Per-pixel likelihood modules.
//!
//! Every module turns a backbone feature map `(B, Cin, H, W)` into
//! distribution parameters over the `(B, C, H, W)` prediction and scores an
//! observed target under that distribution.
//!
//! ```text
//! features --ParameterNet--> (mean, raw logvar)
//!          --aggregate/clamp--> DistrParams
//!          --log_likelihood(target)--> (B, C, H, W)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use usplit_core::likelihood::*;
//!
//! let config = GaussianLikelihoodConfig {
//!     predict_logvar: Some(LogvarGranularity::Pixelwise),
//!     logvar_lowerbound: Some(-5.0),
//!     conv2d_bias: true,
//! };
//! let lik = GaussianLikelihood::new(64, 2, &config, vb.pp("likelihood"))?;
//! let (llik, out) = lik.evaluate(&features, Some(&target))?;
//! ```

mod gaussian;
mod logvar;
mod noise_model;
mod stitching;

pub use gaussian::{log_normal, GaussianLikelihood, GaussianLikelihoodConfig};
pub use logvar::{aggregate_logvar, clamp_logvar, LogvarGranularity};
pub use noise_model::{NoiseModelLikelihood, NoiseModelT};
pub use stitching::GaussianLikelihoodWithStitching;

use candle_core::{Result, Tensor};

/// Distribution parameters predicted for one forward pass.
#[derive(Clone, Debug)]
pub struct DistrParams {
    /// predicted mean, `(B, C, H, W)`
    pub mean: Tensor,
    /// log-variance; `(B, C, H, W)`, `(B, C, 1, 1)` or `(B, 1, 1, 1)`
    pub logvar: Option<Tensor>,
}

/// A descriptive snapshot of one forward pass
#[derive(Clone, Debug)]
pub struct LikelihoodOutput {
    pub mean: Tensor,
    pub mode: Tensor,
    pub sample: Tensor,
    pub params: DistrParams,
    pub logvar: Option<Tensor>,
}

pub trait LikelihoodModuleT {
    /// Derive the distribution parameters from a feature map
    ///
    /// * `x_nchw` - backbone features `(B, Cin, H, W)`
    fn distr_params(&self, x_nchw: &Tensor) -> Result<DistrParams>;

    fn mean(&self, params: &DistrParams) -> Tensor;

    fn mode(&self, params: &DistrParams) -> Tensor;

    /// No stochastic sampling; implementations return the mean.
    fn sample(&self, params: &DistrParams) -> Tensor;

    fn logvar(&self, params: &DistrParams) -> Option<Tensor>;

    /// Pointwise log-likelihood of `x` under `params`; same shape as `x`
    fn log_likelihood(&self, x: &Tensor, params: &DistrParams) -> Result<Tensor>;

    /// Collect the derived quantities of `params` and, if a target is
    /// given, its log-likelihood.
    fn summarize(
        &self,
        params: DistrParams,
        x: Option<&Tensor>,
    ) -> Result<(Option<Tensor>, LikelihoodOutput)> {
        let llik = match x {
            Some(x) => Some(self.log_likelihood(x, &params)?),
            None => None,
        };

        let out = LikelihoodOutput {
            mean: self.mean(&params),
            mode: self.mode(&params),
            sample: self.sample(&params),
            logvar: self.logvar(&params),
            params,
        };

        Ok((llik, out))
    }

    /// Forward pass: features to `(log-likelihood, summary)`
    ///
    /// * `input` - backbone features
    /// * `x` - observed target; `None` for inference-only passes
    fn evaluate(
        &self,
        input: &Tensor,
        x: Option<&Tensor>,
    ) -> Result<(Option<Tensor>, LikelihoodOutput)> {
        let params = self.distr_params(input)?;
        self.summarize(params, x)
    }
}
