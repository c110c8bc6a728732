use candle_core::{Result, Tensor};
use candle_nn::{Conv2d, Conv2dConfig, Module, VarBuilder};

/// A 3x3, padding-1 convolution mapping backbone features to raw
/// distribution parameters; spatial size is preserved.
///
/// * `ch_in` - number of feature channels
/// * `ch_out` - `color_channels` or `2 * color_channels` with logvar
/// * `bias` - whether to learn a bias term
/// * `vb` - variable builder (decides the device and dtype)
///
#[derive(Clone, Debug)]
pub struct ParameterNet {
    conv: Conv2d,
    ch_in: usize,
    ch_out: usize,
}

impl ParameterNet {
    pub fn new(ch_in: usize, ch_out: usize, bias: bool, vb: VarBuilder) -> Result<Self> {
        let config = Conv2dConfig {
            padding: 1,
            ..Default::default()
        };

        let conv = if bias {
            candle_nn::conv2d(ch_in, ch_out, 3, config, vb)?
        } else {
            candle_nn::conv2d_no_bias(ch_in, ch_out, 3, config, vb)?
        };

        Ok(Self {
            conv,
            ch_in,
            ch_out,
        })
    }

    pub fn dim_in(&self) -> usize {
        self.ch_in
    }

    pub fn dim_out(&self) -> usize {
        self.ch_out
    }
}

impl Module for ParameterNet {
    fn forward(&self, x_nchw: &Tensor) -> Result<Tensor> {
        debug_assert_eq!(x_nchw.rank(), 4);
        self.conv.forward(x_nchw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;

    #[test]
    fn test_spatial_size_is_preserved() -> Result<()> {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);

        let net = ParameterNet::new(4, 6, false, vb.pp("parameter_net"))?;
        assert_eq!(net.dim_in(), 4);
        assert_eq!(net.dim_out(), 6);

        let x = Tensor::randn(0f32, 1f32, (2, 4, 5, 7), &device)?;
        assert_eq!(net.forward(&x)?.dims(), &[2, 6, 5, 7]);
        Ok(())
    }
}
