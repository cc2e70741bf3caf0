use thiserror::Error;

/// Problems with the caller's input, detected before generation begins.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no teachers defined")]
    NoTeachers,
    #[error("no rooms defined")]
    NoRooms,
    #[error("no subjects defined")]
    NoSubjects,
    #[error("no working days defined")]
    NoWorkingDays,
    #[error("unknown day name '{0}'")]
    UnknownDay(String),
    #[error("malformed time '{0}', expected HH:MM")]
    MalformedTime(String),
    #[error("malformed lunch window '{0}', expected HH:MM-HH:MM")]
    MalformedLunchWindow(String),
    #[error("end time {end} is not after start time {start}")]
    EmptyWorkingWindow { start: String, end: String },
    #[error("period duration must be greater than zero")]
    ZeroPeriodDuration,
    #[error("period duration of {duration} minutes exceeds the {window}-minute working day")]
    PeriodLongerThanDay { duration: u32, window: u32 },
    #[error("duplicate {kind} id '{id}'")]
    DuplicateId { kind: &'static str, id: String },
    #[error("{owner} references unknown {kind} '{id}'")]
    UnknownReference {
        owner: String,
        kind: &'static str,
        id: String,
    },
    #[error("branch '{0}' has zero sections")]
    NoSections(String),
    #[error("optimizer parameter {name} is out of range: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("invalid input: {}", format_all(.0))]
    Invalid(Vec<ConfigError>),
}

fn format_all(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failure raised by a resolution strategy; the engine logs it and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrategyError {
    #[error("session '{0}' is not in the working schedule")]
    MissingSession(String),
    #[error("{0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_joins_messages() {
        let err = ConfigError::Invalid(vec![ConfigError::NoRooms, ConfigError::NoTeachers]);
        assert_eq!(
            err.to_string(),
            "invalid input: no rooms defined; no teachers defined"
        );
    }
}
