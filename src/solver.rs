use std::time::Instant;

use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::OptimizationConfig;
use crate::data::{InstitutionData, OptimizationResult};
use crate::error::ConfigError;
use crate::fitness::FitnessEvaluator;
use crate::generator::CandidateGenerator;
use crate::grid::build_time_grid;
use crate::optimizer::PopulationOptimizer;
use crate::report::aggregate;
use crate::resolver::{ConflictResolver, ResolutionContext};
use crate::validation::validate_input;

/// Builds a timetable for `data`.
///
/// `config` overrides the optimizer defaults. Runs are reproducible when
/// `config.seed` is set, otherwise the random source is seeded from the OS.
pub fn generate(
    data: &InstitutionData,
    config: Option<OptimizationConfig>,
) -> Result<OptimizationResult, ConfigError> {
    let config = config.unwrap_or_default();
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    generate_with_rng(data, &config, &mut rng)
}

/// Same as [`generate`] with a caller-supplied random source.
pub fn generate_with_rng<R: Rng>(
    data: &InstitutionData,
    config: &OptimizationConfig,
    rng: &mut R,
) -> Result<OptimizationResult, ConfigError> {
    let start_time = Instant::now();
    validate_input(data, config)?;

    let slots = build_time_grid(&data.preferences)?;
    let context = ResolutionContext::from_institution(data, &slots);
    let evaluator = FitnessEvaluator::new(config).with_soft_rules(context.soft_rules());
    let generator = CandidateGenerator::new(data, &slots);

    info!(
        "Searching for a timetable: {} sessions to place, {} slots, {} teachers, {} rooms...",
        generator.requirements().len(),
        slots.len(),
        data.teachers.len(),
        data.rooms.len()
    );
    let optimizer = PopulationOptimizer::new(config, &generator, &evaluator);
    let outcome = optimizer.run(rng);
    info!(
        "Search done in {:.2?}: score {:.2} after {} generations, {} conflicts to resolve",
        start_time.elapsed(),
        outcome.score,
        outcome.iterations,
        outcome.conflicts.len()
    );

    let resolver = ConflictResolver::new(&context);
    let mut schedule = outcome.schedule.clone();
    let resolutions = resolver.resolve_conflicts(&outcome.conflicts, &mut schedule);

    // Repairs may have moved sessions into new collisions.
    let remaining = evaluator.conflicts(&schedule);
    let unscheduled = generator.missing_from(&schedule);
    for hour in &unscheduled {
        warn!(
            "Unscheduled {} hour of {} for {}: {}",
            hour.session_type, hour.subject_id, hour.class_group_id, hour.reason
        );
    }

    let result = aggregate(outcome, schedule, resolutions, remaining, unscheduled);
    info!(
        "Timetable ready in {:.2?}: {} sessions, {}/{} conflicts resolved, score {:.2}",
        start_time.elapsed(),
        result.statistics.total_sessions,
        result.resolution_summary.resolved_conflicts,
        result.resolution_summary.total_conflicts,
        result.optimization_score
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::tests::institution;

    fn quick() -> OptimizationConfig {
        OptimizationConfig {
            max_iterations: 40,
            population_size: 10,
            seed: Some(3),
            ..Default::default()
        }
    }

    #[test]
    fn test_generate_places_every_hour() {
        let result = generate(&institution(), Some(quick())).unwrap();
        assert_eq!(result.statistics.total_sessions, 14);
        assert_eq!(result.statistics.unscheduled_hours, 0);
        assert!(result.unscheduled.is_empty());
        assert!(result.optimization_score >= 0.0);
        assert_eq!(
            result.resolution_summary.total_conflicts,
            result.resolved_conflicts.len() + result.conflicts.len()
        );
    }

    #[test]
    fn test_invalid_input_rejected_before_search() {
        let mut data = institution();
        data.rooms.clear();
        let err = generate(&data, None).unwrap_err();
        assert_eq!(err, ConfigError::Invalid(vec![ConfigError::NoRooms]));
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let first = generate(&institution(), Some(quick())).unwrap();
        let second = generate(&institution(), Some(quick())).unwrap();
        assert_eq!(first.schedule, second.schedule);
        assert_eq!(first.optimization_score, second.optimization_score);
    }
}
