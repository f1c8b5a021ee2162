//! Random program construction: the function/terminal sets and the
//! growth-style initializer.

use rand::Rng;
use serde::Deserialize;
use serde::Serialize;
use strum::Display;
use strum::EnumString;
use strum::VariantArray;

use crate::error::GpError;
use crate::error::Result;
use crate::tree::Node;
use crate::tree::Tree;

/// The arithmetic operators available to generated programs.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    VariantArray,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

/// Function and terminal sets a run draws from. `Node::Var(i)` binds to the
/// i-th entry of `variables`; constants are drawn uniformly from the
/// inclusive `constants` range at node-creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Primitives {
    pub functions: Vec<Op>,
    pub variables: Vec<String>,
    pub constants: Option<(f64, f64)>,
}

impl Primitives {
    /// The full arithmetic function set over the given terminals.
    pub fn arithmetic(variables: Vec<String>, constants: Option<(f64, f64)>) -> Self {
        Self {
            functions: Op::VARIANTS.to_vec(),
            variables,
            constants,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.functions.is_empty() {
            return Err(GpError::Configuration("function set is empty".into()));
        }
        match self.constants {
            Some((lo, hi)) if !lo.is_finite() || !hi.is_finite() || lo > hi => Err(
                GpError::Configuration(format!("invalid constant range {lo}..={hi}")),
            ),
            None if self.variables.is_empty() => Err(GpError::Configuration(
                "terminal set is empty: no variables and no constant range".into(),
            )),
            _ => Ok(()),
        }
    }
}

/// Grows structurally valid random trees: any primitive may appear above the
/// depth limit, terminals only at it, so every branch ends in a terminal.
#[derive(Debug, Clone)]
pub struct NodeFactory {
    primitives: Primitives,
}

impl NodeFactory {
    pub fn new(primitives: Primitives) -> Result<Self> {
        primitives.validate()?;
        Ok(Self { primitives })
    }

    pub const fn primitives(&self) -> &Primitives {
        &self.primitives
    }

    /// A whole random tree with depth at most `max_depth`.
    pub fn tree(&self, rng: &mut impl Rng, max_depth: usize) -> Tree {
        Tree::new(self.grow(rng, 0, max_depth))
    }

    /// Grow a random subtree rooted at `depth`; the subtree adds at most
    /// `limit - depth` edges below that point.
    pub fn grow(&self, rng: &mut impl Rng, depth: usize, limit: usize) -> Node {
        if depth >= limit {
            return self.terminal(rng);
        }
        let slot = rng.random_range(0..self.primitives.functions.len() + self.terminal_slots());
        let Some(op) = self.primitives.functions.get(slot).copied() else {
            return self.terminal(rng);
        };
        let child = |_| Box::new(self.grow(rng, depth + 1, limit));
        match op {
            Op::Add => Node::Add(std::array::from_fn(child)),
            Op::Sub => Node::Sub(std::array::from_fn(child)),
            Op::Mul => Node::Mul(std::array::from_fn(child)),
            Op::Div => Node::Div(std::array::from_fn(child)),
        }
    }

    fn terminal(&self, rng: &mut impl Rng) -> Node {
        let variables = self.primitives.variables.len();
        let slot = rng.random_range(0..self.terminal_slots());
        match self.primitives.constants {
            Some((lo, hi)) if slot == variables => Node::Const(rng.random_range(lo..=hi)),
            _ => Node::Var(slot),
        }
    }

    fn terminal_slots(&self) -> usize {
        self.primitives.variables.len() + usize::from(self.primitives.constants.is_some())
    }
}
