//! The evolution controller: hyperparameters, selection, genetic operators
//! and the generational loop.

use rand::Rng;
use rand::SeedableRng;
use rand::seq::index;
use rayon::prelude::*;
use serde::Deserialize;
use serde::Serialize;

use crate::Random;
use crate::error::GpError;
use crate::error::Result;
use crate::fitness::FitnessEvaluator;
use crate::grow::NodeFactory;
use crate::tree::Tree;

/// Crossover site pairs tried before falling back to reproduction.
const MAX_SPLICE_ATTEMPTS: usize = 5;

/// Hyperparameters of one evolutionary run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GpConfig {
    pub population_size: usize,
    /// Depth bound for generation-zero trees.
    pub max_init_depth: usize,
    /// Depth bound enforced on every tree the operators produce.
    pub max_crossover_depth: usize,
    pub crossover_prob: f64,
    pub mutation_prob: f64,
    pub reproduction_prob: f64,
    pub max_generations: usize,
    /// A best-so-far fitness below this ends the run early.
    pub error_threshold: f64,
    pub tournament_size: usize,
    /// Fixed seed for a reproducible run; a random seed otherwise.
    pub seed: Option<u64>,
}

impl Default for GpConfig {
    fn default() -> Self {
        Self {
            population_size: 1000,
            max_init_depth: 4,
            max_crossover_depth: 8,
            crossover_prob: 0.9,
            mutation_prob: 0.2,
            reproduction_prob: 0.05,
            max_generations: 300,
            error_threshold: 0.001,
            tournament_size: 7,
            seed: None,
        }
    }
}

impl GpConfig {
    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(GpError::Configuration(
                "population size must be positive".into(),
            ));
        }
        if self.max_generations == 0 {
            return Err(GpError::Configuration(
                "maximum generation count must be positive".into(),
            ));
        }
        if self.tournament_size == 0 || self.tournament_size > self.population_size {
            return Err(GpError::Configuration(format!(
                "tournament size {} must be between 1 and the population size {}",
                self.tournament_size, self.population_size
            )));
        }
        if self.max_crossover_depth < self.max_init_depth {
            return Err(GpError::Configuration(format!(
                "crossover depth bound {} is below the initial depth bound {}",
                self.max_crossover_depth, self.max_init_depth
            )));
        }
        for (name, probability) in [
            ("crossover", self.crossover_prob),
            ("mutation", self.mutation_prob),
            ("reproduction", self.reproduction_prob),
        ] {
            if !(0.0..=1.0).contains(&probability) {
                return Err(GpError::Configuration(format!(
                    "{name} probability {probability} is outside [0, 1]"
                )));
            }
        }
        if !self.error_threshold.is_finite() {
            return Err(GpError::Configuration(format!(
                "acceptable error threshold {} is not finite",
                self.error_threshold
            )));
        }
        Ok(())
    }
}

/// What a finished run reports: the best tree ever observed, its fitness and
/// the number of generations actually evaluated.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub best: Tree,
    pub fitness: f64,
    pub generations: usize,
}

/// Per-generation summary passed to the [`Progress`] observer.
#[derive(Debug, Clone, Copy)]
pub struct GenerationStats {
    /// 1-based index of the generation just evaluated.
    pub generation: usize,
    pub best_fitness: f64,
    pub mean_fitness: f64,
    pub best_so_far: f64,
}

/// Observer for generation-by-generation reporting. The engine itself does
/// no console or file output.
pub trait Progress {
    fn on_generation(&mut self, stats: &GenerationStats);
}

impl Progress for () {
    fn on_generation(&mut self, _stats: &GenerationStats) {}
}

/// Drives the generational loop over a population of [`Tree`]s.
#[derive(Debug)]
pub struct Engine {
    config: GpConfig,
    factory: NodeFactory,
    rng: Random,
}

impl Engine {
    pub fn new(config: GpConfig, factory: NodeFactory) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => Random::seed_from_u64(seed),
            None => Random::from_os_rng(),
        };
        Ok(Self {
            config,
            factory,
            rng,
        })
    }

    pub const fn config(&self) -> &GpConfig {
        &self.config
    }

    /// Run until the best-so-far fitness drops below the error threshold or
    /// `max_generations` generations have been evaluated, whichever comes
    /// first.
    ///
    /// Fitness evaluation of a generation runs in parallel; the best-so-far
    /// update and all random draws happen on this thread after the workers
    /// join, so a fixed seed reproduces a run exactly.
    pub fn run<E: FitnessEvaluator>(
        &mut self,
        evaluator: &E,
        progress: &mut impl Progress,
    ) -> Result<RunOutcome> {
        let mut population = self.initial_population();
        let mut best = (Tree::default(), f64::MAX);
        let mut generations = 0;

        for generation in 1..=self.config.max_generations {
            generations = generation;

            let fitness = population
                .par_iter()
                .map(|tree| evaluator.evaluate(tree))
                .collect::<Vec<_>>();

            let best_index = fitness
                .iter()
                .enumerate()
                .min_by(|(_, f1), (_, f2)| f1.partial_cmp(f2).unwrap())
                .map(|(i, _)| i)
                .unwrap();

            if fitness[best_index] < best.1 {
                log::debug!(
                    "generation {generation}: best-so-far improved to {}",
                    fitness[best_index]
                );
                best = (population[best_index].clone(), fitness[best_index]);
            }

            progress.on_generation(&GenerationStats {
                generation,
                best_fitness: fitness[best_index],
                mean_fitness: fitness.iter().sum::<f64>() / fitness.len() as f64,
                best_so_far: best.1,
            });

            if best.1 < self.config.error_threshold {
                log::info!("acceptable error reached after {generation} generations");
                break;
            }
            if generation == self.config.max_generations {
                break;
            }

            population = self.next_generation(&population, &fitness, &best.0);
        }

        Ok(RunOutcome {
            best: best.0,
            fitness: best.1,
            generations,
        })
    }

    fn initial_population(&mut self) -> Vec<Tree> {
        (0..self.config.population_size)
            .map(|_| self.factory.tree(&mut self.rng, self.config.max_init_depth))
            .collect()
    }

    /// The next generation: a copy of the best-so-far tree plus bred
    /// children until the configured size is reached.
    fn next_generation(&mut self, population: &[Tree], fitness: &[f64], elite: &Tree) -> Vec<Tree> {
        let mut next = Vec::with_capacity(population.len());
        next.push(elite.clone());
        while next.len() < population.len() {
            let child = self.breed(population, fitness);
            next.push(child);
        }
        next
    }

    /// Produce one child. The operators gate sequentially in a fixed
    /// priority order: crossover with `crossover_prob`, otherwise mutation
    /// with `mutation_prob`, otherwise reproduction. The probabilities need
    /// not sum to 1; `reproduction_prob` is part of the configuration
    /// surface but reproduction is also the final fallback, so it applies
    /// whenever both earlier gates decline.
    fn breed(&mut self, population: &[Tree], fitness: &[f64]) -> Tree {
        let first = &population[self.select(fitness)];
        if self.rng.random_bool(self.config.crossover_prob) {
            let second = &population[self.select(fitness)];
            self.crossover(first, second)
        } else if self.rng.random_bool(self.config.mutation_prob) {
            self.mutate(first)
        } else {
            first.clone()
        }
    }

    /// Tournament selection: the lowest-fitness individual among
    /// `tournament_size` distinct contestants.
    fn select(&mut self, fitness: &[f64]) -> usize {
        index::sample(&mut self.rng, fitness.len(), self.config.tournament_size)
            .iter()
            .min_by(|&l, &r| fitness[l].partial_cmp(&fitness[r]).unwrap())
            .unwrap()
    }

    /// Splice a copy of a random subtree of `donor` into a random site of a
    /// copy of `receiver`. Site pairs are drawn uniformly over all subtrees;
    /// a pair whose child breaks the depth bound is discarded and redrawn,
    /// and after [`MAX_SPLICE_ATTEMPTS`] failures the child is an unmodified
    /// copy of `receiver`.
    fn crossover(&mut self, receiver: &Tree, donor: &Tree) -> Tree {
        for _ in 0..MAX_SPLICE_ATTEMPTS {
            let graft = donor.site(self.rng.random_range(0..donor.size())).0.clone();
            let mut child = receiver.clone();
            let (site, _) = child.site_mut(self.rng.random_range(0..child.size()));
            *site = graft;
            if child.depth() <= self.config.max_crossover_depth {
                return child;
            }
        }
        log::debug!("no depth-valid splice found in {MAX_SPLICE_ATTEMPTS} attempts, reproducing");
        receiver.clone()
    }

    /// Replace a uniformly chosen subtree of a copy of `parent` with a
    /// freshly grown one, keeping the whole tree within the crossover depth
    /// bound.
    fn mutate(&mut self, parent: &Tree) -> Tree {
        let mut child = parent.clone();
        let index = self.rng.random_range(0..child.size());
        let (site, depth) = child.site_mut(index);
        let limit = self.config.max_crossover_depth.saturating_sub(depth);
        *site = self.factory.grow(&mut self.rng, 0, limit);
        child
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dataset::RegressionCase;
    use crate::fitness::AbsoluteError;
    use crate::grow::Primitives;

    fn primitives() -> Primitives {
        Primitives::arithmetic(vec!["X".to_string()], Some((-1.0, 10.0)))
    }

    fn engine(config: GpConfig) -> Engine {
        Engine::new(config, NodeFactory::new(primitives()).unwrap()).unwrap()
    }

    fn identity_cases() -> Vec<RegressionCase> {
        (1..=10)
            .map(|i| {
                let x = f64::from(i);
                RegressionCase { x, y: x }
            })
            .collect()
    }

    #[test]
    fn default_config_is_valid() {
        assert!(GpConfig::default().validate().is_ok());
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let zero_population = GpConfig {
            population_size: 0,
            ..GpConfig::default()
        };
        assert!(zero_population.validate().is_err());

        let bad_probability = GpConfig {
            mutation_prob: 1.5,
            ..GpConfig::default()
        };
        assert!(bad_probability.validate().is_err());

        let oversized_tournament = GpConfig {
            population_size: 5,
            tournament_size: 7,
            ..GpConfig::default()
        };
        assert!(oversized_tournament.validate().is_err());

        let nan_threshold = GpConfig {
            error_threshold: f64::NAN,
            ..GpConfig::default()
        };
        assert!(nan_threshold.validate().is_err());

        let shallow_crossover = GpConfig {
            max_init_depth: 6,
            max_crossover_depth: 4,
            ..GpConfig::default()
        };
        assert!(shallow_crossover.validate().is_err());
    }

    #[test]
    fn negative_threshold_is_a_valid_way_to_disable_early_exit() {
        let config = GpConfig {
            error_threshold: -1.0,
            ..GpConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = GpConfig {
            seed: Some(7),
            population_size: 123,
            ..GpConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let restored: GpConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.population_size, 123);
        assert_eq!(restored.seed, Some(7));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let restored: GpConfig = serde_json::from_str(r#"{"population_size": 50}"#).unwrap();
        assert_eq!(restored.population_size, 50);
        assert_eq!(restored.max_generations, GpConfig::default().max_generations);
    }

    #[test]
    fn crossover_respects_the_depth_bound() {
        let config = GpConfig {
            population_size: 10,
            max_init_depth: 4,
            max_crossover_depth: 5,
            seed: Some(11),
            ..GpConfig::default()
        };
        let mut engine = engine(config);
        let a = engine.factory.tree(&mut engine.rng, 4);
        let b = engine.factory.tree(&mut engine.rng, 4);
        for _ in 0..200 {
            let child = engine.crossover(&a, &b);
            assert!(child.depth() <= 5);
        }
    }

    #[test]
    fn mutation_respects_the_depth_bound() {
        let config = GpConfig {
            population_size: 10,
            max_init_depth: 4,
            max_crossover_depth: 6,
            seed: Some(12),
            ..GpConfig::default()
        };
        let mut engine = engine(config);
        let parent = engine.factory.tree(&mut engine.rng, 4);
        for _ in 0..200 {
            let child = engine.mutate(&parent);
            assert!(child.depth() <= 6);
        }
    }

    #[test]
    fn closed_gates_reproduce_a_population_member() {
        let config = GpConfig {
            population_size: 8,
            crossover_prob: 0.0,
            mutation_prob: 0.0,
            seed: Some(13),
            tournament_size: 3,
            ..GpConfig::default()
        };
        let mut engine = engine(config);
        let population = engine.initial_population();
        let fitness = vec![1.0; population.len()];
        let child = engine.breed(&population, &fitness);
        assert!(population.contains(&child));
    }

    #[test]
    fn unreachable_threshold_runs_every_generation() {
        let config = GpConfig {
            population_size: 20,
            max_generations: 10,
            error_threshold: -1.0,
            tournament_size: 3,
            seed: Some(14),
            ..GpConfig::default()
        };
        let evaluator = AbsoluteError::new(identity_cases()).unwrap();
        let outcome = engine(config).run(&evaluator, &mut ()).unwrap();
        assert_eq!(outcome.generations, 10);
    }

    #[test]
    fn trivially_fittable_dataset_terminates_early() {
        let config = GpConfig {
            population_size: 200,
            max_generations: 50,
            error_threshold: 0.02,
            tournament_size: 3,
            seed: Some(15),
            ..GpConfig::default()
        };
        let evaluator = AbsoluteError::new(identity_cases()).unwrap();
        let outcome = engine(config).run(&evaluator, &mut ()).unwrap();
        assert!(outcome.generations < 50);
        assert!(outcome.fitness < 0.02);
    }

    #[test]
    fn best_so_far_never_regresses() {
        struct History(Vec<f64>);
        impl Progress for History {
            fn on_generation(&mut self, stats: &GenerationStats) {
                self.0.push(stats.best_so_far);
            }
        }

        let config = GpConfig {
            population_size: 40,
            max_generations: 20,
            error_threshold: -1.0,
            tournament_size: 3,
            seed: Some(16),
            ..GpConfig::default()
        };
        let evaluator = AbsoluteError::new(identity_cases()).unwrap();
        let mut history = History(Vec::new());
        let outcome = engine(config).run(&evaluator, &mut history).unwrap();

        assert_eq!(history.0.len(), outcome.generations);
        for pair in history.0.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
        assert_eq!(outcome.fitness, *history.0.last().unwrap());
    }

    #[test]
    fn fixed_seed_reproduces_a_run() {
        let config = GpConfig {
            population_size: 30,
            max_generations: 8,
            error_threshold: -1.0,
            tournament_size: 3,
            seed: Some(17),
            ..GpConfig::default()
        };
        let evaluator = AbsoluteError::new(identity_cases()).unwrap();
        let first = engine(config.clone()).run(&evaluator, &mut ()).unwrap();
        let second = engine(config).run(&evaluator, &mut ()).unwrap();
        assert_eq!(first.fitness, second.fitness);
        assert_eq!(first.generations, second.generations);
        assert_eq!(first.best, second.best);
    }
}
