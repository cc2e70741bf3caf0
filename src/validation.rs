//! Up-front checks on institution data and optimizer parameters.
//!
//! Every problem found is collected so the caller sees them all at once
//! rather than fixing one error per round trip. Nothing here looks at
//! feasibility: a subject with no qualified teacher is still valid input
//! and simply ends up among the unscheduled hours.

use std::collections::HashSet;

use crate::config::OptimizationConfig;
use crate::data::{InstitutionData, SchedulingPreferences, day_index};
use crate::error::ConfigError;
use crate::grid::{parse_lunch_window, parse_time};

/// Validates `data` and `config`, returning every problem found wrapped in
/// [`ConfigError::Invalid`].
pub fn validate_input(data: &InstitutionData, config: &OptimizationConfig) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if data.teachers.is_empty() {
        errors.push(ConfigError::NoTeachers);
    }
    if data.rooms.is_empty() {
        errors.push(ConfigError::NoRooms);
    }
    if data.subjects.is_empty() {
        errors.push(ConfigError::NoSubjects);
    }

    check_preferences(&data.preferences, &mut errors);
    check_references(data, &mut errors);
    check_config(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(errors))
    }
}

fn check_preferences(prefs: &SchedulingPreferences, errors: &mut Vec<ConfigError>) {
    if prefs.working_days.is_empty() {
        errors.push(ConfigError::NoWorkingDays);
    }
    for day in prefs.working_days.iter().chain(&prefs.no_class_days) {
        if day_index(day).is_none() {
            errors.push(ConfigError::UnknownDay(day.clone()));
        }
    }

    let start = parse_time(&prefs.start_time).map_err(|e| errors.push(e)).ok();
    let end = parse_time(&prefs.end_time).map_err(|e| errors.push(e)).ok();
    if let (Some(start), Some(end)) = (start, end) {
        if end <= start {
            errors.push(ConfigError::EmptyWorkingWindow {
                start: prefs.start_time.clone(),
                end: prefs.end_time.clone(),
            });
        } else if prefs.period_duration > end - start {
            errors.push(ConfigError::PeriodLongerThanDay {
                duration: prefs.period_duration,
                window: end - start,
            });
        }
    }
    if let Err(e) = parse_lunch_window(&prefs.lunch_break) {
        errors.push(e);
    }
    if prefs.period_duration == 0 {
        errors.push(ConfigError::ZeroPeriodDuration);
    }
}

fn check_references(data: &InstitutionData, errors: &mut Vec<ConfigError>) {
    let mut branch_ids = HashSet::new();
    for branch in &data.branches {
        if !branch_ids.insert(branch.id.as_str()) {
            errors.push(duplicate("branch", &branch.id));
        }
        if branch.sections == 0 {
            errors.push(ConfigError::NoSections(branch.id.clone()));
        }
    }

    let mut subject_ids = HashSet::new();
    for subject in &data.subjects {
        if !subject_ids.insert(subject.id.as_str()) {
            errors.push(duplicate("subject", &subject.id));
        }
        if !branch_ids.contains(subject.branch_id.as_str()) {
            errors.push(ConfigError::UnknownReference {
                owner: format!("subject '{}'", subject.id),
                kind: "branch",
                id: subject.branch_id.clone(),
            });
        }
    }

    let mut teacher_ids = HashSet::new();
    for teacher in &data.teachers {
        if !teacher_ids.insert(teacher.id.as_str()) {
            errors.push(duplicate("teacher", &teacher.id));
        }
        for subject_id in &teacher.subject_ids {
            if !subject_ids.contains(subject_id.as_str()) {
                errors.push(ConfigError::UnknownReference {
                    owner: format!("teacher '{}'", teacher.id),
                    kind: "subject",
                    id: subject_id.clone(),
                });
            }
        }
    }

    let mut room_ids = HashSet::new();
    for room in &data.rooms {
        if !room_ids.insert(room.id.as_str()) {
            errors.push(duplicate("room", &room.id));
        }
    }
}

fn duplicate(kind: &'static str, id: &str) -> ConfigError {
    ConfigError::DuplicateId {
        kind,
        id: id.to_string(),
    }
}

fn check_config(config: &OptimizationConfig, errors: &mut Vec<ConfigError>) {
    let rates = [
        ("mutationRate", config.mutation_rate),
        ("crossoverRate", config.crossover_rate),
        ("elitismRate", config.elitism_rate),
    ];
    for (name, rate) in rates {
        if !(0.0..=1.0).contains(&rate) {
            errors.push(ConfigError::InvalidParameter {
                name,
                reason: format!("{} is outside [0, 1]", rate),
            });
        }
    }

    let counts = [
        ("maxIterations", config.max_iterations),
        ("populationSize", config.population_size),
        ("tournamentSize", config.tournament_size),
    ];
    for (name, count) in counts {
        if count == 0 {
            errors.push(ConfigError::InvalidParameter {
                name,
                reason: "must be at least 1".to_string(),
            });
        }
    }

    if config.convergence_threshold.is_nan() || config.convergence_threshold < 0.0 {
        errors.push(ConfigError::InvalidParameter {
            name: "convergenceThreshold",
            reason: format!("{} is negative", config.convergence_threshold),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::tests::{institution, teacher};

    fn problems(result: Result<(), ConfigError>) -> Vec<ConfigError> {
        match result {
            Err(ConfigError::Invalid(errors)) => errors,
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_input_passes() {
        assert!(validate_input(&institution(), &OptimizationConfig::default()).is_ok());
    }

    #[test]
    fn test_empty_collections_reported_together() {
        let mut data = institution();
        data.teachers.clear();
        data.rooms.clear();
        data.preferences.working_days.clear();

        let errors = problems(validate_input(&data, &OptimizationConfig::default()));
        assert_eq!(
            errors,
            vec![ConfigError::NoTeachers, ConfigError::NoRooms, ConfigError::NoWorkingDays]
        );
    }

    #[test]
    fn test_bad_times_and_days() {
        let mut data = institution();
        data.preferences.start_time = "17:00".into();
        data.preferences.end_time = "09:00".into();
        data.preferences.lunch_break = "lunch".into();
        data.preferences.no_class_days = vec!["Caturday".into()];

        let errors = problems(validate_input(&data, &OptimizationConfig::default()));
        assert!(errors.contains(&ConfigError::UnknownDay("Caturday".into())));
        assert!(errors.contains(&ConfigError::MalformedLunchWindow("lunch".into())));
        assert!(errors.iter().any(|e| matches!(e, ConfigError::EmptyWorkingWindow { .. })));
    }

    #[test]
    fn test_oversized_period_rejected() {
        let mut data = institution();
        data.preferences.period_duration = u32::MAX;

        let errors = problems(validate_input(&data, &OptimizationConfig::default()));
        assert_eq!(
            errors,
            vec![ConfigError::PeriodLongerThanDay {
                duration: u32::MAX,
                window: 480
            }]
        );
    }

    #[test]
    fn test_duplicates_and_dangling_references() {
        let mut data = institution();
        data.teachers.push(teacher("T1", &["GEO"]));
        data.subjects[0].branch_id = "EE".into();
        data.branches[0].sections = 0;

        let errors = problems(validate_input(&data, &OptimizationConfig::default()));
        assert!(errors.contains(&ConfigError::DuplicateId {
            kind: "teacher",
            id: "T1".into()
        }));
        assert!(errors.contains(&ConfigError::UnknownReference {
            owner: "teacher 'T1'".into(),
            kind: "subject",
            id: "GEO".into()
        }));
        assert!(errors.contains(&ConfigError::UnknownReference {
            owner: "subject 'ALG'".into(),
            kind: "branch",
            id: "EE".into()
        }));
        assert!(errors.contains(&ConfigError::NoSections("CS".into())));
    }

    #[test]
    fn test_out_of_range_parameters() {
        let config = OptimizationConfig {
            mutation_rate: 1.5,
            population_size: 0,
            ..Default::default()
        };
        let errors = problems(validate_input(&institution(), &config));
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| matches!(e, ConfigError::InvalidParameter { .. })));
    }
}
