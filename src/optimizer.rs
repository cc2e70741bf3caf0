//! Generational search over candidate schedules.
//!
//! Each generation is scored in full before the next one is bred
//! (elitism, tournament selection, single-point crossover, slot mutation).
//! The best schedule ever seen is kept across generations, so the reported
//! best score never decreases.

use std::collections::HashMap;

use log::{debug, trace};
use rand::Rng;
use rand::prelude::IndexedRandom;

use crate::config::OptimizationConfig;
use crate::data::{ConflictInfo, Schedule, Session, TimeSlot};
use crate::fitness::FitnessEvaluator;
use crate::generator::CandidateGenerator;

/// Result of a finished search.
#[derive(Debug, Clone)]
pub struct OptimizerOutcome {
    /// Best schedule seen in any generation.
    pub schedule: Schedule,
    /// Conflicts of `schedule`, freshly recomputed.
    pub conflicts: Vec<ConflictInfo>,
    pub score: f64,
    pub iterations: usize,
    pub converged: bool,
    /// Best-ever score after each evaluated generation.
    pub score_history: Vec<f64>,
}

pub struct PopulationOptimizer<'a> {
    config: &'a OptimizationConfig,
    generator: &'a CandidateGenerator<'a>,
    evaluator: &'a FitnessEvaluator,
    open_slots: Vec<&'a TimeSlot>,
}

impl<'a> PopulationOptimizer<'a> {
    pub fn new(
        config: &'a OptimizationConfig,
        generator: &'a CandidateGenerator<'a>,
        evaluator: &'a FitnessEvaluator,
    ) -> Self {
        Self {
            config,
            generator,
            evaluator,
            open_slots: generator.open_slots().to_vec(),
        }
    }

    pub fn run<R: Rng>(&self, rng: &mut R) -> OptimizerOutcome {
        let mut population: Vec<Schedule> = (0..self.config.population_size)
            .map(|_| self.generator.generate(rng).sessions)
            .collect();

        let mut best: Option<(f64, Schedule)> = None;
        let mut score_history = Vec::new();
        let mut last_generation_best: Option<f64> = None;
        let mut stable_generations = 0;
        let mut converged = false;
        let mut iteration = 0;

        while iteration < self.config.max_iterations {
            // Evaluate
            let scores: Vec<f64> = population.iter().map(|s| self.evaluator.evaluate(s)).collect();
            let Some((best_index, &generation_best)) =
                scores.iter().enumerate().max_by(|a, b| a.1.total_cmp(b.1))
            else {
                break;
            };

            if best.as_ref().is_none_or(|(score, _)| generation_best > *score) {
                best = Some((generation_best, population[best_index].clone()));
            }
            if let Some((score, _)) = &best {
                score_history.push(*score);
            }

            if last_generation_best
                .is_some_and(|last| (generation_best - last).abs() < self.config.convergence_threshold)
            {
                stable_generations += 1;
                if stable_generations >= self.config.convergence_window {
                    converged = true;
                    break;
                }
            } else {
                stable_generations = 0;
            }
            last_generation_best = Some(generation_best);

            trace!(
                "Generation {}: best {:.3}, best ever {:.3}",
                iteration,
                generation_best,
                score_history.last().copied().unwrap_or_default()
            );

            // Select, recombine, mutate
            population = self.next_generation(&population, &scores, rng);
            iteration += 1;
        }

        let (score, schedule) = best.unwrap_or_default();
        let conflicts = self.evaluator.conflicts(&schedule);
        debug!(
            "Search finished after {} generations (converged: {}), best score {:.3}, {} conflicts left",
            iteration,
            converged,
            score,
            conflicts.len()
        );
        OptimizerOutcome {
            schedule,
            conflicts,
            score,
            iterations: iteration,
            converged,
            score_history,
        }
    }

    fn next_generation<R: Rng>(
        &self,
        population: &[Schedule],
        scores: &[f64],
        rng: &mut R,
    ) -> Vec<Schedule> {
        let size = self.config.population_size;
        let mut ranked: Vec<usize> = (0..population.len()).collect();
        ranked.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

        let mut next: Vec<Schedule> = ranked
            .iter()
            .take(self.config.elite_count())
            .map(|&i| population[i].clone())
            .collect();

        while next.len() < size {
            let first = &population[self.tournament(scores, rng)];
            let second = &population[self.tournament(scores, rng)];
            let mut child = self.crossover(first, second, rng);
            self.mutate(&mut child, rng);
            next.push(child);
        }
        next
    }

    /// Index of the fittest of `tournament_size` random draws.
    fn tournament<R: Rng>(&self, scores: &[f64], rng: &mut R) -> usize {
        let mut winner = rng.random_range(0..scores.len());
        for _ in 1..self.config.tournament_size {
            let challenger = rng.random_range(0..scores.len());
            if scores[challenger] > scores[winner] {
                winner = challenger;
            }
        }
        winner
    }

    /// Single-point crossover aligned by session id: the child keeps
    /// `first`'s sessions before the cut and `second`'s placement of the
    /// same sessions after it.
    pub(crate) fn crossover<R: Rng>(&self, first: &[Session], second: &[Session], rng: &mut R) -> Schedule {
        if !rng.random_bool(self.config.crossover_rate) {
            return first.to_vec();
        }
        let len = first.len().min(second.len());
        let cut = if len == 0 { 0 } else { rng.random_range(0..len) };
        let donor: HashMap<&str, &Session> = second.iter().map(|s| (s.id.as_str(), s)).collect();

        first
            .iter()
            .enumerate()
            .map(|(i, session)| {
                if i < cut {
                    session.clone()
                } else {
                    donor.get(session.id.as_str()).map_or_else(|| session.clone(), |s| (*s).clone())
                }
            })
            .collect()
    }

    /// Moves each session, with probability `mutation_rate`, to a random
    /// open slot. Feasibility is not checked.
    pub(crate) fn mutate<R: Rng>(&self, schedule: &mut [Session], rng: &mut R) {
        for session in schedule.iter_mut() {
            if rng.random_bool(self.config.mutation_rate) {
                if let Some(slot) = self.open_slots.choose(rng) {
                    session.time_slot = (*slot).clone();
                }
            }
        }
    }
}
