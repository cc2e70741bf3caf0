//! Fitness of a candidate schedule.
//!
//! Starts at [`BASE_SCORE`], subtracts `weight(type) * multiplier(severity)`
//! per conflict and adds bonuses for an even spread over the grid and for
//! teacher/room loads near their ideal weekly hours. Never below zero.

use std::collections::{BTreeMap, HashMap};

use crate::config::{OptimizationConfig, Weightings};
use crate::data::{ConflictInfo, Session, SlotRef};
use crate::detector::{SoftRules, detect_conflicts};

pub const BASE_SCORE: f64 = 100.0;

const DEFAULT_TIME_DISTRIBUTION_WEIGHT: f64 = 4.0;
const DEFAULT_ROOM_UTILIZATION_WEIGHT: f64 = 2.0;

#[derive(Debug, Clone)]
pub struct FitnessEvaluator {
    weightings: Weightings,
    ideal_teacher_hours: f64,
    ideal_room_hours: f64,
    rules: Option<SoftRules>,
}

impl FitnessEvaluator {
    pub fn new(config: &OptimizationConfig) -> Self {
        Self {
            weightings: config.weightings.clone(),
            ideal_teacher_hours: config.ideal_teacher_hours,
            ideal_room_hours: config.ideal_room_hours,
            rules: None,
        }
    }

    /// Also penalise preference and constraint violations.
    pub fn with_soft_rules(mut self, rules: SoftRules) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Hard conflicts, followed by soft violations when rules are set.
    pub fn conflicts(&self, schedule: &[Session]) -> Vec<ConflictInfo> {
        let mut conflicts = detect_conflicts(schedule);
        if let Some(rules) = &self.rules {
            conflicts.extend(rules.check(schedule));
        }
        conflicts
    }

    pub fn evaluate(&self, schedule: &[Session]) -> f64 {
        let conflicts = self.conflicts(schedule);
        self.score(schedule, &conflicts)
    }

    /// Scores `schedule` given its already-detected conflicts.
    pub fn score(&self, schedule: &[Session], conflicts: &[ConflictInfo]) -> f64 {
        let penalty: f64 = conflicts
            .iter()
            .map(|c| self.weightings.for_conflict(c.conflict_type) * c.severity.multiplier())
            .sum();
        let score = BASE_SCORE - penalty
            + self.distribution_bonus(schedule)
            + self.utilization_bonus(schedule);
        score.max(0.0)
    }

    /// `10 - variance` of session counts over the occupied slots.
    fn distribution_bonus(&self, schedule: &[Session]) -> f64 {
        let mut counts: BTreeMap<SlotRef, usize> = BTreeMap::new();
        for session in schedule {
            *counts.entry(session.slot_ref()).or_default() += 1;
        }
        if counts.is_empty() {
            return 0.0;
        }
        let n = counts.len() as f64;
        let mean = counts.values().sum::<usize>() as f64 / n;
        let variance = counts
            .values()
            .map(|&c| (c as f64 - mean).powi(2))
            .sum::<f64>()
            / n;
        let scale = self.weightings.time_distribution / DEFAULT_TIME_DISTRIBUTION_WEIGHT;
        (10.0 - variance).max(0.0) * scale
    }

    fn utilization_bonus(&self, schedule: &[Session]) -> f64 {
        let avg_teacher = average_load(schedule.iter().map(|s| s.teacher_id.as_str()));
        let avg_room = average_load(schedule.iter().map(|s| s.room_id.as_str()));

        let teacher_bonus = (5.0 - (avg_teacher - self.ideal_teacher_hours).abs() / 5.0).max(0.0);
        let room_bonus = (5.0 - (avg_room - self.ideal_room_hours).abs() / 10.0).max(0.0);
        let scale = self.weightings.room_utilization / DEFAULT_ROOM_UTILIZATION_WEIGHT;
        teacher_bonus + room_bonus * scale
    }
}

/// Mean number of sessions per distinct key; 0 for an empty schedule.
pub(crate) fn average_load<'s>(keys: impl Iterator<Item = &'s str>) -> f64 {
    let mut load: HashMap<&str, usize> = HashMap::new();
    for key in keys {
        *load.entry(key).or_default() += 1;
    }
    if load.is_empty() {
        return 0.0;
    }
    load.values().sum::<usize>() as f64 / load.len() as f64
}
