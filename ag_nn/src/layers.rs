//! Layers: thin wrappers that wire graph nodes together and remember their
//! widths. Trainable state lives in the graph variables, not here.

use ag_graph::Function;
use ag_ndarray::NDarray;
use rand::Rng;

pub enum Layer {
    Input {
        nodes: usize,
        function: Function,
    },
    Dense {
        in_nodes: usize,
        out_nodes: usize,
        function: Function,
        weights: Function,
        biases: Function,
    },
    Sigmoid {
        nodes: usize,
        function: Function,
    },
    Tanh {
        nodes: usize,
        function: Function,
    },
}

impl Layer {
    pub fn input(nodes: usize) -> Self {
        Layer::Input {
            nodes,
            function: Function::variable("inputs", NDarray::zeros(&[1, nodes])),
        }
    }

    /// Fully connected layer. Weights start uniform in [-s, s) with
    /// s = 2/sqrt(in_nodes); biases start at zero with shape [1, out].
    pub fn dense<R: Rng + ?Sized>(
        prev: &Function,
        in_nodes: usize,
        out_nodes: usize,
        rng: &mut R,
    ) -> Self {
        let s = 2.0 / (in_nodes as f64).sqrt();
        let weights = Function::variable(
            "weights",
            NDarray::uniform(-s, s, &[in_nodes, out_nodes], rng),
        );
        let biases = Function::variable("biases", NDarray::zeros(&[1, out_nodes]));
        let function = prev.dot(&weights).add(&biases);
        Layer::Dense {
            in_nodes,
            out_nodes,
            function,
            weights,
            biases,
        }
    }

    pub fn sigmoid(prev: &Function, nodes: usize) -> Self {
        Layer::Sigmoid {
            nodes,
            function: prev.sigmoid(),
        }
    }

    pub fn tanh(prev: &Function, nodes: usize) -> Self {
        Layer::Tanh {
            nodes,
            function: prev.tanh(),
        }
    }

    /// The graph node this layer outputs.
    pub fn function(&self) -> &Function {
        match self {
            Layer::Input { function, .. }
            | Layer::Dense { function, .. }
            | Layer::Sigmoid { function, .. }
            | Layer::Tanh { function, .. } => function,
        }
    }

    pub fn out_nodes(&self) -> usize {
        match self {
            Layer::Input { nodes, .. }
            | Layer::Sigmoid { nodes, .. }
            | Layer::Tanh { nodes, .. } => *nodes,
            Layer::Dense { out_nodes, .. } => *out_nodes,
        }
    }
}
