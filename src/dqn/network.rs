//! Multilayer Q-network using tch-rs (PyTorch bindings).
//!
//! This module is only available with the `rl-nn` feature.

use std::path::Path;

use tch::{nn, nn::Module, nn::OptimizerConfig, Device, Kind, Reduction, Tensor};

use super::estimator::QEstimator;
use crate::error::{Error, Result};

/// MLP action-value network trained with Adam on mean squared error.
///
/// Architecture: `state_dim → 128 → 64 → action_count` with ReLU activations
/// and a linear head.
pub struct QNetwork {
    vs: nn::VarStore,
    net: nn::Sequential,
    opt: nn::Optimizer,
    state_dim: usize,
    action_count: usize,
}

impl QNetwork {
    /// Creates a freshly initialized network.
    pub fn new(
        state_dim: usize,
        action_count: usize,
        learning_rate: f64,
        device: Device,
    ) -> Result<Self> {
        let vs = nn::VarStore::new(device);
        let p = &vs.root();
        let net = nn::seq()
            .add(nn::linear(
                p / "l1",
                state_dim as i64,
                128,
                Default::default(),
            ))
            .add_fn(|x| x.relu())
            .add(nn::linear(p / "l2", 128, 64, Default::default()))
            .add_fn(|x| x.relu())
            .add(nn::linear(
                p / "l3",
                64,
                action_count as i64,
                Default::default(),
            ));
        let opt = nn::Adam::default().build(&vs, learning_rate)?;

        Ok(Self {
            vs,
            net,
            opt,
            state_dim,
            action_count,
        })
    }

    fn input(&self, state: &[f64]) -> Result<Tensor> {
        Error::check_len("network input", self.state_dim, state.len())?;
        Ok(Tensor::from_slice(state)
            .to_kind(Kind::Float)
            .to_device(self.vs.device())
            .unsqueeze(0))
    }
}

impl QEstimator for QNetwork {
    const WEIGHTS_EXTENSION: &'static str = "ot";

    fn action_count(&self) -> usize {
        self.action_count
    }

    fn predict(&self, state: &[f64]) -> Result<Vec<f64>> {
        let x = self.input(state)?;
        let q = tch::no_grad(|| self.net.forward(&x));
        Ok(Vec::<f64>::try_from(q.reshape([-1]).to_kind(Kind::Double))?)
    }

    fn fit(&mut self, state: &[f64], target: &[f64]) -> Result<()> {
        Error::check_len("network target", self.action_count, target.len())?;
        let x = self.input(state)?;
        let y = Tensor::from_slice(target)
            .to_kind(Kind::Float)
            .to_device(self.vs.device())
            .unsqueeze(0);
        let loss = self.net.forward(&x).mse_loss(&y, Reduction::Mean);
        self.opt.zero_grad();
        loss.backward();
        self.opt.step();
        Ok(())
    }

    fn save(&self, path: &Path) -> Result<()> {
        self.vs.save(path)?;
        Ok(())
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        self.vs.load(path)?;
        Ok(())
    }

    fn parameters(&self) -> Result<Vec<Vec<f64>>> {
        let mut vars: Vec<(String, Tensor)> = self.vs.variables().into_iter().collect();
        vars.sort_by(|a, b| a.0.cmp(&b.0));
        vars.into_iter()
            .map(|(_, t)| -> Result<Vec<f64>> {
                Ok(Vec::<f64>::try_from(t.reshape([-1]).to_kind(Kind::Double))?)
            })
            .collect()
    }

    fn blend_from(&mut self, source: &Self, tau: f64) -> Result<()> {
        let sources = source.vs.variables();
        tch::no_grad(|| {
            for (name, mut target) in self.vs.variables() {
                let src = sources.get(&name).ok_or(Error::IncompatibleParameters)?;
                if src.size() != target.size() {
                    return Err(Error::IncompatibleParameters);
                }
                let blended = src * tau + &target * (1.0 - tau);
                target.copy_(&blended);
            }
            Ok(())
        })
    }
}
