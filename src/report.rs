//! Assembles the final [`OptimizationResult`] from the search outcome and
//! the resolver's verdicts.
//!
//! The reported conflicts are checked against the final schedule: a fix
//! that was undone or that introduced a new collision shows up as
//! unresolved.

use std::collections::BTreeMap;

use crate::data::{
    ConflictInfo, ConflictType, OptimizationResult, ResolutionSummary, Schedule, Session,
    Statistics, UnscheduledHour,
};
use crate::fitness::average_load;
use crate::optimizer::OptimizerOutcome;
use crate::resolver::ConflictResolution;

/// Score bonus per resolved conflict.
const RESOLUTION_BONUS: f64 = 5.0;
const MAX_SCORE: f64 = 100.0;

/// `remaining` holds the conflicts detected on the final `schedule`.
pub fn aggregate(
    outcome: OptimizerOutcome,
    schedule: Schedule,
    resolutions: Vec<ConflictResolution>,
    remaining: Vec<ConflictInfo>,
    unscheduled: Vec<UnscheduledHour>,
) -> OptimizationResult {
    let mut resolved: Vec<ConflictInfo> = Vec::new();
    let mut unresolved: Vec<ConflictInfo> = Vec::new();
    let mut methods = Vec::new();

    for ConflictResolution { mut conflict, result } in resolutions {
        let undone = is_hard(conflict.conflict_type)
            && remaining.iter().any(|r| same_conflict(&conflict, r));
        if result.success && !undone {
            conflict.resolved = true;
            conflict.resolution_method = Some(result.explanation.clone());
            methods.push(result.explanation);
            resolved.push(conflict);
        } else {
            unresolved.push(conflict);
        }
    }

    // Collisions created by the repairs themselves; accepted soft
    // violations stay resolved.
    for conflict in remaining {
        let known = unresolved.iter().any(|u| same_conflict(u, &conflict))
            || (!is_hard(conflict.conflict_type)
                && resolved.iter().any(|r| same_conflict(r, &conflict)));
        if !known {
            unresolved.push(conflict);
        }
    }

    let total_conflicts = resolved.len() + unresolved.len();
    let resolution_rate = if total_conflicts == 0 {
        100.0
    } else {
        resolved.len() as f64 / total_conflicts as f64 * 100.0
    };
    let optimization_score = if resolved.is_empty() {
        outcome.score
    } else {
        (outcome.score + RESOLUTION_BONUS * resolved.len() as f64).min(MAX_SCORE)
    };

    let statistics = Statistics {
        total_sessions: schedule.len(),
        conflicts_resolved: resolved.len(),
        teacher_utilization: average_load(schedule.iter().map(|s| s.teacher_id.as_str())),
        room_utilization: average_load(schedule.iter().map(|s| s.room_id.as_str())),
        time_distribution: time_distribution(&schedule),
        average_gaps_between_classes: average_gaps(&schedule),
        unscheduled_hours: unscheduled.len(),
    };

    OptimizationResult {
        schedule,
        conflicts: unresolved,
        resolution_summary: ResolutionSummary {
            total_conflicts,
            resolved_conflicts: resolved.len(),
            resolution_rate,
            resolution_methods: methods,
        },
        resolved_conflicts: resolved,
        optimization_score,
        iterations: outcome.iterations,
        convergence_reached: outcome.converged,
        statistics,
        unscheduled,
    }
}

fn is_hard(conflict_type: ConflictType) -> bool {
    matches!(
        conflict_type,
        ConflictType::Teacher | ConflictType::Room | ConflictType::Class
    )
}

/// Same kind of conflict over the same sessions (two shared ids, or the
/// single id of a one-session violation).
fn same_conflict(a: &ConflictInfo, b: &ConflictInfo) -> bool {
    a.conflict_type == b.conflict_type
        && a.affected_session_ids
            .intersection(&b.affected_session_ids)
            .count()
            >= 2.min(a.affected_session_ids.len())
}

/// Sessions per weekday, Monday first.
pub fn time_distribution(schedule: &[Session]) -> [usize; 7] {
    let mut days = [0; 7];
    for session in schedule {
        if let Some(count) = days.get_mut(session.time_slot.day as usize) {
            *count += 1;
        }
    }
    days
}

/// Mean idle periods per class group: within each day, the sum of
/// `max(0, gap - 1)` between consecutive sessions.
pub fn average_gaps(schedule: &[Session]) -> f64 {
    let mut groups: BTreeMap<&str, Vec<(u8, u32)>> = BTreeMap::new();
    for session in schedule {
        groups
            .entry(session.class_group_id.as_str())
            .or_default()
            .push((session.time_slot.day, session.time_slot.period));
    }
    if groups.is_empty() {
        return 0.0;
    }

    let total: u32 = groups
        .values_mut()
        .map(|slots| {
            slots.sort_unstable();
            slots
                .windows(2)
                .filter(|w| w[0].0 == w[1].0)
                .map(|w| (w[1].1 - w[0].1).saturating_sub(1))
                .sum::<u32>()
        })
        .sum();
    total as f64 / groups.len() as f64
}
