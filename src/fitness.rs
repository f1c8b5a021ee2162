//! Fitness scoring: pluggable, lower-is-better evaluators over a fixed
//! dataset.

use crate::dataset::ClassificationData;
use crate::dataset::RegressionCase;
use crate::error::GpError;
use crate::error::Result;
use crate::tree::Tree;

/// Scores below this normalize to exactly 0, declaring a perfect fit.
pub const PERFECT_EPSILON: f64 = 1.0e-9;

/// Ceiling returned when accumulated error overflows, keeping scores
/// finite and totally ordered.
pub const MAX_ERROR: f64 = f64::MAX;

/// Scores a candidate program against the evaluator's dataset. Lower is
/// strictly better and a perfect fit scores exactly 0. Implementations are
/// pure: neither the tree nor the dataset is mutated, so a population can be
/// scored in parallel.
pub trait FitnessEvaluator: Sync {
    fn evaluate(&self, tree: &Tree) -> f64;
}

/// Regression scoring: the accumulated absolute error over every record.
#[derive(Debug, Clone)]
pub struct AbsoluteError {
    cases: Vec<RegressionCase>,
}

impl AbsoluteError {
    pub fn new(cases: Vec<RegressionCase>) -> Result<Self> {
        if cases.is_empty() {
            return Err(GpError::EmptyDataset);
        }
        Ok(Self { cases })
    }

    pub fn cases(&self) -> &[RegressionCase] {
        &self.cases
    }
}

impl FitnessEvaluator for AbsoluteError {
    fn evaluate(&self, tree: &Tree) -> f64 {
        let mut total = 0.0;
        for case in &self.cases {
            let predicted = tree.eval(&[case.x]);
            total += (predicted - case.y).abs();
            if !total.is_finite() {
                return MAX_ERROR;
            }
        }
        if total < PERFECT_EPSILON { 0.0 } else { total }
    }
}

/// Classification scoring: the fraction of records the program mislabels.
///
/// The program's single output picks a class by sign: a negative value
/// predicts `sign_classes[0]`, a non-negative one `sign_classes[1]`.
#[derive(Debug, Clone)]
pub struct Misclassification {
    data: ClassificationData,
}

impl Misclassification {
    pub fn new(data: ClassificationData) -> Result<Self> {
        if data.instances.is_empty() {
            return Err(GpError::EmptyDataset);
        }
        Ok(Self { data })
    }

    pub const fn data(&self) -> &ClassificationData {
        &self.data
    }

    /// Fraction of records labelled correctly, for reporting.
    pub fn accuracy(&self, tree: &Tree) -> f64 {
        1.0 - self.evaluate(tree)
    }
}

impl FitnessEvaluator for Misclassification {
    fn evaluate(&self, tree: &Tree) -> f64 {
        let mut correct = 0.0;
        for instance in &self.data.instances {
            let output = tree.eval(&instance.attributes);
            let predicted = if output < 0.0 {
                self.data.sign_classes[0]
            } else {
                self.data.sign_classes[1]
            };
            if predicted == instance.label {
                correct += 1.0;
            }
        }
        if correct < PERFECT_EPSILON {
            correct = 0.0;
        }
        1.0 - correct / self.data.instances.len() as f64
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dataset::Instance;
    use crate::tree::Node;

    fn identity() -> Tree {
        Tree::new(Node::Var(0))
    }

    fn instances(labels: &[i64]) -> ClassificationData {
        ClassificationData {
            instances: labels
                .iter()
                .enumerate()
                .map(|(id, label)| Instance {
                    id: id as i64,
                    attributes: vec![1.0],
                    label: *label,
                })
                .collect(),
            names: vec!["clump".to_string()],
            sign_classes: [2, 4],
        }
    }

    #[test]
    fn identity_fits_identity_data_exactly() {
        let cases = (0..20)
            .map(|i| {
                let x = f64::from(i) / 2.0;
                RegressionCase { x, y: x }
            })
            .collect();
        let evaluator = AbsoluteError::new(cases).unwrap();
        assert_eq!(evaluator.evaluate(&identity()), 0.0);
    }

    #[test]
    fn regression_error_accumulates_absolute_differences() {
        let cases = vec![
            RegressionCase { x: 1.0, y: 3.0 },
            RegressionCase { x: 2.0, y: 0.0 },
        ];
        let evaluator = AbsoluteError::new(cases).unwrap();
        // identity predicts 1 and 2: |1-3| + |2-0| = 4
        assert_eq!(evaluator.evaluate(&identity()), 4.0);
    }

    #[test]
    fn overflowing_error_clamps_to_the_ceiling() {
        let cases = vec![RegressionCase { x: 1.0, y: 0.0 }];
        let evaluator = AbsoluteError::new(cases).unwrap();
        let huge = Tree::new(Node::Mul([
            Box::new(Node::Const(1e308)),
            Box::new(Node::Const(1e308)),
        ]));
        assert_eq!(evaluator.evaluate(&huge), MAX_ERROR);
    }

    #[test]
    fn empty_regression_dataset_is_rejected() {
        assert!(matches!(
            AbsoluteError::new(vec![]),
            Err(GpError::EmptyDataset)
        ));
    }

    #[test]
    fn constant_positive_program_misses_every_first_class_record() {
        let evaluator = Misclassification::new(instances(&[2, 2, 2, 4, 4])).unwrap();
        let always_positive = Tree::new(Node::Const(1.0));
        // predicts class 4 everywhere: the three class-2 records are wrong
        assert_eq!(evaluator.evaluate(&always_positive), 3.0 / 5.0);
    }

    #[test]
    fn sign_splits_the_two_classes() {
        let data = ClassificationData {
            instances: vec![
                Instance {
                    id: 0,
                    attributes: vec![-1.0],
                    label: 2,
                },
                Instance {
                    id: 1,
                    attributes: vec![1.0],
                    label: 4,
                },
            ],
            names: vec!["a".to_string()],
            sign_classes: [2, 4],
        };
        let evaluator = Misclassification::new(data).unwrap();
        assert_eq!(evaluator.evaluate(&identity()), 0.0);
        assert_eq!(evaluator.accuracy(&identity()), 1.0);
    }

    #[test]
    fn all_wrong_scores_one() {
        let evaluator = Misclassification::new(instances(&[2, 2])).unwrap();
        let always_positive = Tree::new(Node::Const(5.0));
        assert_eq!(evaluator.evaluate(&always_positive), 1.0);
    }

    #[test]
    fn empty_classification_dataset_is_rejected() {
        let data = ClassificationData {
            instances: vec![],
            names: vec![],
            sign_classes: [2, 4],
        };
        assert!(matches!(
            Misclassification::new(data),
            Err(GpError::EmptyDataset)
        ));
    }
}
