//! Neural-network scaffolding over the autodiff graph: layers, a chain
//! builder, mean squared error and SGD.

mod chain;
mod layers;
mod loss;
mod optim;

pub use chain::Chain;
pub use layers::Layer;
pub use loss::MseLoss;
pub use optim::Sgd;
