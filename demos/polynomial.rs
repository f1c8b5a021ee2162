//! Evolves an approximation of `y = 2x + x + 4` from synthetic samples.

use symgp::AbsoluteError;
use symgp::Engine;
use symgp::GpConfig;
use symgp::NodeFactory;
use symgp::Primitives;
use symgp::RegressionCase;

pub fn main() -> symgp::Result<()> {
    let cases = (0..100)
        .map(|i| {
            let x = f64::from(i) / 100.0;
            RegressionCase {
                x,
                y: (x * 2.0) + x + 4.0,
            }
        })
        .collect();
    let evaluator = AbsoluteError::new(cases)?;

    let primitives = Primitives::arithmetic(vec!["x".to_string()], Some((-1.0, 10.0)));
    let config = GpConfig {
        population_size: 500,
        max_init_depth: 6,
        max_generations: 100,
        error_threshold: 0.01,
        seed: Some(0),
        ..GpConfig::default()
    };

    let mut engine = Engine::new(config, NodeFactory::new(primitives)?)?;
    let outcome = engine.run(&evaluator, &mut ())?;

    let names = vec!["x".to_string()];
    println!(
        "fitness {:.6} after {} generations",
        outcome.fitness, outcome.generations
    );
    println!("{}", outcome.best.expression(&names));

    let mut simple = outcome.best.clone();
    simple.simplify();
    println!("----");
    println!("{}", simple.expression(&names));
    Ok(())
}
