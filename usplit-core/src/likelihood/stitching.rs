use candle_core::{Result, Tensor};

use super::{DistrParams, LikelihoodModuleT, LikelihoodOutput};

/// Shift the predicted mean by an external offset before anything is
/// derived from it.
///
/// Overlapping prediction tiles are brought into a common frame this way
/// before they are scored against the ground truth.
pub struct GaussianLikelihoodWithStitching<L>
where
    L: LikelihoodModuleT,
{
    inner: L,
}

impl<L> GaussianLikelihoodWithStitching<L>
where
    L: LikelihoodModuleT,
{
    pub fn new(inner: L) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }

    pub fn into_inner(self) -> L {
        self.inner
    }

    /// Parameters of the wrapped module with `mean + offset`
    ///
    /// * `input` - backbone features
    /// * `offset` - broadcastable to the mean
    pub fn distr_params_with_offset(&self, input: &Tensor, offset: &Tensor) -> Result<DistrParams> {
        let params = self.inner.distr_params(input)?;
        Ok(DistrParams {
            mean: params.mean.broadcast_add(offset)?,
            logvar: params.logvar,
        })
    }

    /// Same as [`LikelihoodModuleT::evaluate`] of the wrapped module but on
    /// the shifted mean
    ///
    /// * `input` - backbone features
    /// * `x` - observed target; `None` for inference-only passes
    /// * `offset` - broadcastable to the mean
    pub fn evaluate(
        &self,
        input: &Tensor,
        x: Option<&Tensor>,
        offset: &Tensor,
    ) -> Result<(Option<Tensor>, LikelihoodOutput)> {
        let params = self.distr_params_with_offset(input, offset)?;
        self.inner.summarize(params, x)
    }
}
