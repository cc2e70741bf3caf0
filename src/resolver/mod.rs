//! Post-search conflict repair.
//!
//! Conflicts are handled one at a time, most severe first. For each, the
//! applicable strategies run in priority order until one is confident
//! enough; accepted fixes are folded into the working schedule before the
//! next conflict is looked at.
//!
//! # Submodules
//!
//! - [`context`]: read-only preferences, capacities and institution rules
//! - [`strategies`]: the [`ResolutionStrategy`] trait and built-in catalogue

pub mod context;
pub mod strategies;

use std::collections::HashMap;

use log::{debug, warn};

use crate::data::{ConflictInfo, Schedule, Session};
use crate::detector::{SoftRules, still_conflicting};

pub use context::ResolutionContext;
pub use strategies::{AlternativeSolution, ResolutionResult, ResolutionStrategy, default_strategies};

/// A result at or above this confidence is accepted without trying the
/// remaining strategies.
pub const ACCEPT_CONFIDENCE: f64 = 0.8;

/// Outcome for one input conflict.
#[derive(Debug, Clone)]
pub struct ConflictResolution {
    pub conflict: ConflictInfo,
    pub result: ResolutionResult,
}

pub struct ConflictResolver<'c> {
    strategies: Vec<Box<dyn ResolutionStrategy>>,
    context: &'c ResolutionContext,
    rules: SoftRules,
}

impl<'c> ConflictResolver<'c> {
    /// A resolver with the built-in strategy catalogue.
    pub fn new(context: &'c ResolutionContext) -> Self {
        Self::with_strategies(context, default_strategies())
    }

    pub fn with_strategies(
        context: &'c ResolutionContext,
        strategies: Vec<Box<dyn ResolutionStrategy>>,
    ) -> Self {
        Self {
            strategies,
            context,
            rules: context.soft_rules(),
        }
    }

    pub fn register(&mut self, strategy: Box<dyn ResolutionStrategy>) {
        self.strategies.push(strategy);
    }

    /// Resolves `conflicts` against `schedule`, applying successful fixes
    /// in place. Returns one entry per input conflict, most severe first.
    pub fn resolve_conflicts(
        &self,
        conflicts: &[ConflictInfo],
        schedule: &mut Schedule,
    ) -> Vec<ConflictResolution> {
        let mut ordered: Vec<&ConflictInfo> = conflicts.iter().collect();
        ordered.sort_by(|a, b| b.severity.cmp(&a.severity));

        let mut resolutions = Vec::with_capacity(ordered.len());
        for conflict in ordered {
            let result = if still_conflicting(conflict, schedule, &self.rules) {
                self.resolve_conflict(conflict, schedule)
            } else {
                ResolutionResult {
                    success: true,
                    modified_sessions: Vec::new(),
                    alternative_solutions: Vec::new(),
                    explanation: "Cleared by an earlier resolution".to_string(),
                    confidence: 1.0,
                    impact_score: 0.0,
                }
            };

            if result.success {
                apply_modifications(schedule, &result.modified_sessions);
            }
            debug!(
                "{} -> {} ({})",
                conflict,
                if result.success { "resolved" } else { "unresolved" },
                result.explanation
            );
            resolutions.push(ConflictResolution {
                conflict: conflict.clone(),
                result,
            });
        }
        resolutions
    }

    fn resolve_conflict(&self, conflict: &ConflictInfo, schedule: &[Session]) -> ResolutionResult {
        let mut applicable: Vec<&dyn ResolutionStrategy> = self
            .strategies
            .iter()
            .map(|s| &**s)
            .filter(|s| s.applicable_conflict_types().contains(&conflict.conflict_type))
            .collect();
        applicable.sort_by(|a, b| b.priority().cmp(&a.priority()));

        if applicable.is_empty() {
            return ResolutionResult::failure("No applicable resolution strategy found");
        }

        let mut best: Option<ResolutionResult> = None;
        let mut failures = Vec::new();
        for strategy in applicable {
            let result = match strategy.resolve(conflict, schedule, self.context) {
                Ok(result) => result,
                Err(e) => {
                    warn!("Strategy {} failed on '{}': {}", strategy.name(), conflict.description, e);
                    failures.push(format!("{}: {}", strategy.name(), e));
                    continue;
                }
            };
            if !result.success {
                failures.push(format!("{}: {}", strategy.name(), result.explanation));
                continue;
            }

            let confident = result.confidence >= ACCEPT_CONFIDENCE;
            if best.as_ref().is_none_or(|b| result.confidence > b.confidence) {
                best = Some(ResolutionResult {
                    explanation: format!("Resolved using {}: {}", strategy.name(), result.explanation),
                    ..result
                });
            }
            if confident {
                break;
            }
        }

        best.unwrap_or_else(|| ResolutionResult::failure(failures.join("; ")))
    }
}

/// Replaces sessions in `schedule` by id.
fn apply_modifications(schedule: &mut Schedule, modified: &[Session]) {
    if modified.is_empty() {
        return;
    }
    let updates: HashMap<&str, &Session> = modified.iter().map(|s| (s.id.as_str(), s)).collect();
    for session in schedule.iter_mut() {
        if let Some(update) = updates.get(session.id.as_str()) {
            *session = (*update).clone();
        }
    }
}
