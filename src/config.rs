//! Optimizer configuration.
//!
//! Every field carries a serde default, so a caller may send only the
//! parameters it wants to override.

use serde::{Deserialize, Serialize};

use crate::data::ConflictType;

/// Penalty weights applied per conflict type and soft objective.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Weightings {
    pub teacher_conflicts: f64,
    pub room_conflicts: f64,
    pub class_conflicts: f64,
    pub teacher_preferences: f64,
    pub room_utilization: f64,
    pub time_distribution: f64,
    pub consecutive_hours: f64,
    pub lunch_break_violations: f64,
}

impl Default for Weightings {
    fn default() -> Self {
        Self {
            teacher_conflicts: 10.0,
            room_conflicts: 8.0,
            class_conflicts: 10.0,
            teacher_preferences: 3.0,
            room_utilization: 2.0,
            time_distribution: 4.0,
            consecutive_hours: 5.0,
            lunch_break_violations: 7.0,
        }
    }
}

impl Weightings {
    /// Weight subtracted (times the severity multiplier) for one conflict.
    pub fn for_conflict(&self, conflict_type: ConflictType) -> f64 {
        match conflict_type {
            ConflictType::Teacher => self.teacher_conflicts,
            ConflictType::Room => self.room_conflicts,
            ConflictType::Class => self.class_conflicts,
            ConflictType::Preference => self.teacher_preferences,
            ConflictType::Constraint => self.consecutive_hours,
        }
    }
}

/// Parameters of the population search.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptimizationConfig {
    pub max_iterations: usize,
    pub population_size: usize,
    pub mutation_rate: f64,
    pub crossover_rate: f64,
    pub elitism_rate: f64,
    pub convergence_threshold: f64,
    /// Consecutive generations without meaningful change before stopping.
    pub convergence_window: usize,
    pub tournament_size: usize,
    pub ideal_teacher_hours: f64,
    pub ideal_room_hours: f64,
    /// Fixed seed for reproducible runs; `None` seeds from the OS.
    pub seed: Option<u64>,
    pub weightings: Weightings,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            population_size: 50,
            mutation_rate: 0.1,
            crossover_rate: 0.8,
            elitism_rate: 0.2,
            convergence_threshold: 0.001,
            convergence_window: 50,
            tournament_size: 3,
            ideal_teacher_hours: 20.0,
            ideal_room_hours: 30.0,
            seed: None,
            weightings: Weightings::default(),
        }
    }
}

impl OptimizationConfig {
    /// Number of top candidates carried unchanged into the next generation.
    pub fn elite_count(&self) -> usize {
        ((self.population_size as f64) * self.elitism_rate).floor() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config: OptimizationConfig = serde_json::from_str(
            r#"{"maxIterations": 10, "weightings": {"roomConflicts": 1.5}}"#,
        )
        .unwrap();
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.population_size, 50);
        assert_eq!(config.weightings.room_conflicts, 1.5);
        assert_eq!(config.weightings.teacher_conflicts, 10.0);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_elite_count_floors() {
        let config = OptimizationConfig {
            population_size: 7,
            elitism_rate: 0.2,
            ..Default::default()
        };
        assert_eq!(config.elite_count(), 1);
    }

    #[test]
    fn test_weight_per_conflict_type() {
        let w = Weightings::default();
        assert_eq!(w.for_conflict(ConflictType::Teacher), 10.0);
        assert_eq!(w.for_conflict(ConflictType::Room), 8.0);
        assert_eq!(w.for_conflict(ConflictType::Preference), 3.0);
        assert_eq!(w.for_conflict(ConflictType::Constraint), 5.0);
    }
}
