//! The [`Chain`] builder: stack layers, then drive the usual
//! forward / loss / backward / update / reset training cycle.

use ag_graph::Function;
use ag_ndarray::{NDarray, NdResult};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::layers::Layer;
use crate::loss::MseLoss;
use crate::optim::Sgd;

/// A feed-forward stack of layers over one shared graph. Trainable variables
/// are collected into a flat list as layers are added, so updates and
/// resets never need to walk the layer structure.
pub struct Chain {
    input: Function,
    layers: Vec<Layer>,
    params: Vec<Function>,
    width: usize,
    rng: StdRng,
    loss_fn: MseLoss,
}

impl Chain {
    pub fn new(in_nodes: usize, seed: u64) -> Self {
        let input = Layer::input(in_nodes);
        let function = input.function().clone();
        Chain {
            input: function,
            layers: vec![input],
            params: Vec::new(),
            width: in_nodes,
            rng: StdRng::seed_from_u64(seed),
            loss_fn: MseLoss,
        }
    }

    pub fn dense(mut self, out_nodes: usize) -> Self {
        let layer = Layer::dense(&self.output(), self.width, out_nodes, &mut self.rng);
        if let Layer::Dense { weights, biases, .. } = &layer {
            self.params.push(weights.clone());
            self.params.push(biases.clone());
        }
        self.width = out_nodes;
        self.layers.push(layer);
        self
    }

    pub fn sigmoid(mut self) -> Self {
        let layer = Layer::sigmoid(&self.output(), self.width);
        self.layers.push(layer);
        self
    }

    pub fn tanh(mut self) -> Self {
        let layer = Layer::tanh(&self.output(), self.width);
        self.layers.push(layer);
        self
    }

    /// The node the last layer outputs.
    pub fn output(&self) -> Function {
        match self.layers.last() {
            Some(layer) => layer.function().clone(),
            None => self.input.clone(),
        }
    }

    pub fn parameters(&self) -> &[Function] {
        &self.params
    }

    pub fn out_nodes(&self) -> usize {
        self.width
    }

    pub fn forward(&self, x: &NDarray<f64>) -> NdResult<()> {
        self.input.set_value(x.clone());
        self.output().forward()
    }

    /// Loss of the current output against `target`.
    pub fn loss(&self, target: &NDarray<f64>) -> NdResult<f64> {
        self.loss_fn.loss(target, &self.output().value())
    }

    pub fn backward(&self, target: &NDarray<f64>) -> NdResult<()> {
        self.loss_fn.backward(&self.output(), target)
    }

    pub fn update_sgd(&self, lr: f64) -> NdResult<()> {
        Sgd::new(lr).step(&self.params)
    }

    pub fn reset_gradients(&self) {
        self.output().reset_grad();
    }

    pub fn predict(&self, x: &NDarray<f64>) -> NdResult<NDarray<f64>> {
        self.forward(x)?;
        Ok(self.output().value())
    }
}
