//! Genetic-programming search for symbolic programs that fit a numeric
//! dataset.
//!
//! Candidate solutions are arithmetic expression [`Tree`]s grown from a
//! configurable function and terminal set. An [`Engine`] evolves a fixed-size
//! population through tournament selection, depth-bounded subtree crossover,
//! subtree mutation and reproduction, scored by a pluggable
//! [`FitnessEvaluator`]: accumulated absolute error for regression, or the
//! misclassified fraction for binary classification.
//!
//! ```no_run
//! use symgp::AbsoluteError;
//! use symgp::Engine;
//! use symgp::GpConfig;
//! use symgp::NodeFactory;
//! use symgp::Primitives;
//! use symgp::RegressionCase;
//!
//! # fn main() -> symgp::Result<()> {
//! let cases = (0..20)
//!     .map(|i| {
//!         let x = f64::from(i) / 2.0;
//!         RegressionCase { x, y: 2.0 * x }
//!     })
//!     .collect();
//! let evaluator = AbsoluteError::new(cases)?;
//!
//! let primitives = Primitives::arithmetic(vec!["X".to_string()], Some((-1.0, 10.0)));
//! let mut engine = Engine::new(GpConfig::default(), NodeFactory::new(primitives)?)?;
//! let outcome = engine.run(&evaluator, &mut ())?;
//! println!("{}", outcome.best.expression(&["X".to_string()]));
//! # Ok(())
//! # }
//! ```

pub mod dataset;
pub mod error;
pub mod evolve;
pub mod fitness;
pub mod grow;
pub mod tree;

pub use dataset::ClassificationData;
pub use dataset::ClassificationFormat;
pub use dataset::DEFAULT_MISSING_VALUE;
pub use dataset::Instance;
pub use dataset::RegressionCase;
pub use error::GpError;
pub use error::Result;
pub use evolve::Engine;
pub use evolve::GenerationStats;
pub use evolve::GpConfig;
pub use evolve::Progress;
pub use evolve::RunOutcome;
pub use fitness::AbsoluteError;
pub use fitness::FitnessEvaluator;
pub use fitness::Misclassification;
pub use grow::NodeFactory;
pub use grow::Op;
pub use grow::Primitives;
pub use tree::DIV_BY_ZERO_VALUE;
pub use tree::Node;
pub use tree::Tree;

/// Random source used across the crate.
pub type Random = rand_xoshiro::Xoshiro256PlusPlus;
