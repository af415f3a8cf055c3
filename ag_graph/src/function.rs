//! The computation graph.
//!
//! A [`Function`] is a cheaply clonable handle to a shared node; building an
//! expression wires handles together into a DAG, so the same variable can
//! feed several consumers and its gradient contributions sum up. Values and
//! gradients are `f64` arrays.
//!
//! `backward` follows an accumulate-then-recurse contract: a node first folds
//! the incoming gradient into its own accumulator (reducing broadcast axes
//! back down with a left-anchored sum), then hands each operand only that
//! operand's local contribution. Calling `backward` twice without a reset
//! therefore doubles every accumulator in the graph, at any depth.

use std::cell::RefCell;
use std::rc::Rc;

use ag_ndarray::{NDarray, NdResult};

#[derive(Clone)]
enum Op {
    Variable { name: String },
    Sigmoid(Function),
    Tanh(Function),
    Transpose(Function),
    Add(Function, Function),
    Mul(Function, Function),
    Dot(Function, Function),
}

struct Node {
    op: Op,
    value: NDarray<f64>,
    grad: Option<NDarray<f64>>,
}

/// Shared handle to a graph node.
#[derive(Clone)]
pub struct Function {
    node: Rc<RefCell<Node>>,
}

impl Function {
    fn from_op(op: Op, value: NDarray<f64>) -> Self {
        Function {
            node: Rc::new(RefCell::new(Node {
                op,
                value,
                grad: None,
            })),
        }
    }

    /// A leaf holding a value; everything trainable is one of these.
    pub fn variable(name: &str, value: NDarray<f64>) -> Self {
        Self::from_op(Op::Variable { name: name.to_string() }, value)
    }

    pub fn sigmoid(&self) -> Function {
        Self::from_op(Op::Sigmoid(self.clone()), NDarray::zeros(&[1]))
    }

    pub fn tanh(&self) -> Function {
        Self::from_op(Op::Tanh(self.clone()), NDarray::zeros(&[1]))
    }

    pub fn transpose(&self) -> Function {
        Self::from_op(Op::Transpose(self.clone()), NDarray::zeros(&[1]))
    }

    pub fn add(&self, rhs: &Function) -> Function {
        Self::from_op(Op::Add(self.clone(), rhs.clone()), NDarray::zeros(&[1]))
    }

    pub fn mul(&self, rhs: &Function) -> Function {
        Self::from_op(Op::Mul(self.clone(), rhs.clone()), NDarray::zeros(&[1]))
    }

    pub fn dot(&self, rhs: &Function) -> Function {
        Self::from_op(Op::Dot(self.clone(), rhs.clone()), NDarray::zeros(&[1]))
    }

    /// The variable's name, if this node is one.
    pub fn name(&self) -> Option<String> {
        match &self.node.borrow().op {
            Op::Variable { name } => Some(name.clone()),
            _ => None,
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self.node.borrow().op, Op::Variable { .. })
    }

    pub fn value(&self) -> NDarray<f64> {
        self.node.borrow().value.clone()
    }

    pub fn grad(&self) -> Option<NDarray<f64>> {
        self.node.borrow().grad.clone()
    }

    pub fn shape(&self) -> Vec<usize> {
        self.node.borrow().value.shape().to_vec()
    }

    /// Replace a leaf's value (typically the network input between batches).
    pub fn set_value(&self, value: NDarray<f64>) {
        self.node.borrow_mut().value = value;
    }

    fn operands(&self) -> Vec<Function> {
        match &self.node.borrow().op {
            Op::Variable { .. } => vec![],
            Op::Sigmoid(x) | Op::Tanh(x) | Op::Transpose(x) => vec![x.clone()],
            Op::Add(l, r) | Op::Mul(l, r) | Op::Dot(l, r) => {
                vec![l.clone(), r.clone()]
            }
        }
    }

    /// Recompute this node's value, operands first.
    pub fn forward(&self) -> NdResult<()> {
        for operand in self.operands() {
            operand.forward()?;
        }

        let op = self.node.borrow().op.clone();
        let value = match &op {
            Op::Variable { .. } => return Ok(()),
            Op::Sigmoid(x) => x.value().sigmoid()?,
            Op::Tanh(x) => x.value().tanh()?,
            Op::Transpose(x) => x.value().t()?,
            Op::Add(l, r) => l.value().add(&r.value())?,
            Op::Mul(l, r) => l.value().mul(&r.value())?,
            Op::Dot(l, r) => l.value().dot(&r.value())?,
        };
        self.node.borrow_mut().value = value;
        Ok(())
    }

    /// Fold `dy` into this node's accumulator, then push each operand its
    /// local contribution.
    pub fn backward(&self, dy: &NDarray<f64>) -> NdResult<()> {
        self.accumulate(dy)?;

        let op = self.node.borrow().op.clone();
        match &op {
            Op::Variable { .. } => {}
            Op::Sigmoid(x) => {
                let d = self.node.borrow().value.dsigmoid();
                x.backward(&d.mul(dy)?)?;
            }
            Op::Tanh(x) => {
                let d = self.node.borrow().value.dtanh();
                x.backward(&d.mul(dy)?)?;
            }
            Op::Transpose(x) => {
                x.backward(&dy.t()?)?;
            }
            Op::Add(l, r) => {
                l.backward(dy)?;
                r.backward(dy)?;
            }
            Op::Mul(l, r) => {
                l.backward(&dy.mul(&r.value())?)?;
                r.backward(&dy.mul(&l.value())?)?;
            }
            Op::Dot(l, r) => {
                l.backward(&dy.dot(&r.value().t()?)?)?;
                r.backward(&l.value().t()?.dot(dy)?)?;
            }
        }
        Ok(())
    }

    // Broadcast axes of dy fold back down to this node's own shape.
    fn accumulate(&self, dy: &NDarray<f64>) -> NdResult<()> {
        let mut node = self.node.borrow_mut();
        let grad = match node.grad.take() {
            Some(g) => g,
            None => NDarray::zeros(node.value.shape()),
        };
        node.grad = Some(grad.add_bc_left(dy)?);
        Ok(())
    }

    /// Zero every accumulator in the subgraph, keeping shapes.
    pub fn reset_grad(&self) {
        {
            let mut node = self.node.borrow_mut();
            // reborrow so the grad and value field borrows split
            let node = &mut *node;
            match node.grad.as_mut() {
                Some(g) if g.shape() == node.value.shape() => g.fill(0.0),
                _ => {
                    let zeros = NDarray::zeros(node.value.shape());
                    node.grad = Some(zeros);
                }
            }
        }
        for operand in self.operands() {
            operand.reset_grad();
        }
    }

    /// One step of gradient descent on this node's value.
    pub fn sgd_step(&self, lr: f64) -> NdResult<()> {
        let mut node = self.node.borrow_mut();
        if let Some(grad) = &node.grad {
            node.value = node.value.sub(&grad.apply(|g| g * lr))?;
        }
        Ok(())
    }
}
