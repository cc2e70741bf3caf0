//! Conflict detection.
//!
//! [`detect_conflicts`] finds hard collisions (a teacher, room, or class
//! group booked twice in one slot). [`SoftRules`] adds preference and
//! constraint violations that depend on institution settings. Both are
//! pure: conflicts are recomputed from the schedule every time.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::data::{
    ConflictInfo, ConflictType, Session, SessionId, Severity, SlotRef, TeacherId, day_name,
};

/// Reports every double booking in `schedule`, grouped by slot and then by
/// teacher, room, and class group. Output order is deterministic.
pub fn detect_conflicts(schedule: &[Session]) -> Vec<ConflictInfo> {
    let mut by_slot: BTreeMap<SlotRef, Vec<&Session>> = BTreeMap::new();
    for session in schedule {
        by_slot.entry(session.slot_ref()).or_default().push(session);
    }

    let mut conflicts = Vec::new();
    for (slot, sessions) in &by_slot {
        if sessions.len() <= 1 {
            continue;
        }
        collisions(sessions, |s| &s.teacher_id, |id, ids| {
            ConflictInfo::new(
                ConflictType::Teacher,
                Severity::Critical,
                format!("Teacher {id} has multiple sessions at {slot}"),
                ids,
            )
            .with_suggested_fix("Reschedule one of the conflicting sessions")
        }, &mut conflicts);
        collisions(sessions, |s| &s.room_id, |id, ids| {
            ConflictInfo::new(
                ConflictType::Room,
                Severity::High,
                format!("Room {id} has multiple sessions at {slot}"),
                ids,
            )
            .with_suggested_fix("Assign different rooms or reschedule")
        }, &mut conflicts);
        collisions(sessions, |s| &s.class_group_id, |id, ids| {
            ConflictInfo::new(
                ConflictType::Class,
                Severity::Critical,
                format!("Class {id} has multiple sessions at {slot}"),
                ids,
            )
            .with_suggested_fix("Reschedule conflicting sessions")
        }, &mut conflicts);
    }
    conflicts
}

fn collisions<'s, K, B>(sessions: &[&'s Session], key: K, build: B, out: &mut Vec<ConflictInfo>)
where
    K: Fn(&'s Session) -> &'s String,
    B: Fn(&str, Vec<SessionId>) -> ConflictInfo,
{
    let mut groups: BTreeMap<&str, Vec<SessionId>> = BTreeMap::new();
    for session in sessions {
        groups.entry(key(*session).as_str()).or_default().push(session.id.clone());
    }
    for (id, ids) in groups {
        if ids.len() > 1 {
            out.push(build(id, ids));
        }
    }
}

/// Whether a conflict still holds in `schedule`: its affected sessions
/// still exist and at least two of them still collide on the conflict's
/// dimension. Soft conflicts are re-checked against `rules` instead.
pub fn still_conflicting(conflict: &ConflictInfo, schedule: &[Session], rules: &SoftRules) -> bool {
    let current = match conflict.conflict_type {
        ConflictType::Teacher | ConflictType::Room | ConflictType::Class => detect_conflicts(schedule),
        ConflictType::Preference | ConflictType::Constraint => rules.check(schedule),
    };
    current.iter().any(|c| {
        c.conflict_type == conflict.conflict_type
            && c.affected_session_ids
                .intersection(&conflict.affected_session_ids)
                .count()
                >= 2.min(conflict.affected_session_ids.len())
    })
}

/// Institution-level soft rules checked on top of hard collisions.
///
/// `teacher_limits` holds (max consecutive, max daily) periods per teacher.
#[derive(Debug, Clone, Default)]
pub struct SoftRules {
    unavailable: HashMap<TeacherId, HashSet<SlotRef>>,
    teacher_limits: HashMap<TeacherId, (u32, u32)>,
    no_class_days: HashSet<u8>,
    max_consecutive_hours: u32,
}

impl SoftRules {
    pub fn new(
        unavailable: HashMap<TeacherId, HashSet<SlotRef>>,
        teacher_limits: HashMap<TeacherId, (u32, u32)>,
        no_class_days: HashSet<u8>,
        max_consecutive_hours: u32,
    ) -> Self {
        Self {
            unavailable,
            teacher_limits,
            no_class_days,
            max_consecutive_hours,
        }
    }

    /// Preference and constraint violations in `schedule`.
    pub fn check(&self, schedule: &[Session]) -> Vec<ConflictInfo> {
        let mut conflicts = Vec::new();

        for session in schedule {
            let slot = session.slot_ref();
            if self
                .unavailable
                .get(&session.teacher_id)
                .is_some_and(|slots| slots.contains(&slot))
            {
                conflicts.push(
                    ConflictInfo::new(
                        ConflictType::Preference,
                        Severity::Low,
                        format!(
                            "Teacher {} is unavailable at {slot} but teaches {}",
                            session.teacher_id, session.id
                        ),
                        [session.id.clone()],
                    )
                    .with_suggested_fix("Move the session to a slot the teacher prefers"),
                );
            }
            if self.no_class_days.contains(&slot.day) {
                conflicts.push(ConflictInfo::new(
                    ConflictType::Constraint,
                    Severity::Medium,
                    format!("Session {} is placed on a no-class day ({slot})", session.id),
                    [session.id.clone()],
                ));
            }
        }

        let by_group = daily_periods(schedule, |s| &s.class_group_id);
        for ((group, day), periods) in &by_group {
            for run in long_runs(periods, self.max_consecutive_hours) {
                conflicts.push(ConflictInfo::new(
                    ConflictType::Constraint,
                    Severity::Medium,
                    format!(
                        "Class {group} has {} consecutive periods on {}",
                        run.len(),
                        day_name(*day)
                    ),
                    run,
                ));
            }
        }

        let by_teacher = daily_periods(schedule, |s| &s.teacher_id);
        for ((teacher, day), periods) in &by_teacher {
            let (max_consecutive, max_daily) = self
                .teacher_limits
                .get(*teacher)
                .copied()
                .unwrap_or((self.max_consecutive_hours, u32::MAX));
            for run in long_runs(periods, max_consecutive) {
                conflicts.push(ConflictInfo::new(
                    ConflictType::Constraint,
                    Severity::Medium,
                    format!(
                        "Teacher {teacher} has {} consecutive periods on {}",
                        run.len(),
                        day_name(*day)
                    ),
                    run,
                ));
            }
            let hours = periods.len() as u32;
            if hours > max_daily {
                conflicts.push(ConflictInfo::new(
                    ConflictType::Constraint,
                    Severity::Medium,
                    format!(
                        "Teacher {teacher} teaches {hours} periods on {} (limit {max_daily})",
                        day_name(*day)
                    ),
                    periods.values().flatten().cloned(),
                ));
            }
        }

        conflicts
    }
}

/// Session ids per (entity, day), keyed by period.
fn daily_periods<'s, K>(
    schedule: &'s [Session],
    key: K,
) -> BTreeMap<(&'s str, u8), BTreeMap<u32, Vec<SessionId>>>
where
    K: Fn(&'s Session) -> &'s String,
{
    let mut map: BTreeMap<(&str, u8), BTreeMap<u32, Vec<SessionId>>> = BTreeMap::new();
    for session in schedule {
        map.entry((key(session).as_str(), session.time_slot.day))
            .or_default()
            .entry(session.time_slot.period)
            .or_default()
            .push(session.id.clone());
    }
    map
}

/// Runs of back-to-back periods longer than `limit`, as session ids.
fn long_runs(periods: &BTreeMap<u32, Vec<SessionId>>, limit: u32) -> Vec<Vec<SessionId>> {
    let mut runs = Vec::new();
    let mut current: Vec<u32> = Vec::new();
    for &period in periods.keys() {
        if current.last().is_some_and(|&last| last + 1 != period) {
            runs.push(std::mem::take(&mut current));
        }
        current.push(period);
    }
    runs.push(current);

    runs.into_iter()
        .filter(|run| run.len() as u32 > limit)
        .map(|run| {
            run.iter()
                .flat_map(|p| periods.get(p).into_iter().flatten().cloned())
                .collect()
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::{SessionType, TimeSlot};

    pub(crate) fn session(id: &str, teacher: &str, room: &str, group: &str, day: u8, period: u32) -> Session {
        Session {
            id: id.into(),
            subject_id: "ALG".into(),
            teacher_id: teacher.into(),
            room_id: room.into(),
            class_group_id: group.into(),
            time_slot: TimeSlot {
                day,
                period,
                start_time: format!("{:02}:00", 9 + period),
                end_time: format!("{:02}:00", 10 + period),
                is_break: false,
            },
            session_type: SessionType::Theory,
            duration_minutes: 60,
        }
    }

    #[test]
    fn test_no_conflicts_in_clean_schedule() {
        let schedule = vec![
            session("s1", "T1", "R1", "G1", 0, 0),
            session("s2", "T1", "R1", "G1", 0, 1),
            session("s3", "T2", "R2", "G2", 0, 0),
        ];
        assert!(detect_conflicts(&schedule).is_empty());
    }

    #[test]
    fn test_teacher_collision_names_both_sessions() {
        let schedule = vec![
            session("s1", "T1", "R1", "G1", 1, 2),
            session("s2", "T1", "R2", "G2", 1, 2),
        ];
        let conflicts = detect_conflicts(&schedule);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_type, ConflictType::Teacher);
        assert_eq!(conflicts[0].severity, Severity::Critical);
        assert!(conflicts[0].affected_session_ids.contains("s1"));
        assert!(conflicts[0].affected_session_ids.contains("s2"));
    }

    #[test]
    fn test_each_dimension_reported_separately() {
        let schedule = vec![
            session("s1", "T1", "R1", "G1", 0, 0),
            session("s2", "T1", "R1", "G1", 0, 0),
        ];
        let types: Vec<_> = detect_conflicts(&schedule)
            .iter()
            .map(|c| (c.conflict_type, c.severity))
            .collect();
        assert_eq!(
            types,
            vec![
                (ConflictType::Teacher, Severity::Critical),
                (ConflictType::Room, Severity::High),
                (ConflictType::Class, Severity::Critical),
            ]
        );
    }

    #[test]
    fn test_detection_is_repeatable() {
        let schedule = vec![
            session("a", "T1", "R1", "G1", 0, 0),
            session("b", "T1", "R2", "G2", 0, 0),
            session("c", "T3", "R2", "G3", 0, 0),
            session("d", "T4", "R4", "G3", 2, 1),
            session("e", "T5", "R5", "G3", 2, 1),
        ];
        let first = detect_conflicts(&schedule);
        for _ in 0..5 {
            assert_eq!(detect_conflicts(&schedule), first);
        }
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_long_class_run_is_constraint() {
        let rules = SoftRules {
            max_consecutive_hours: 2,
            ..Default::default()
        };
        let schedule = vec![
            session("s1", "T1", "R1", "G1", 0, 0),
            session("s2", "T2", "R1", "G1", 0, 1),
            session("s3", "T3", "R1", "G1", 0, 2),
            session("s4", "T4", "R1", "G1", 0, 5),
        ];
        let conflicts = rules.check(&schedule);
        let class_runs: Vec<_> = conflicts
            .iter()
            .filter(|c| c.description.starts_with("Class"))
            .collect();
        assert_eq!(class_runs.len(), 1);
        assert_eq!(class_runs[0].conflict_type, ConflictType::Constraint);
        assert_eq!(class_runs[0].affected_session_ids.len(), 3);
    }

    #[test]
    fn test_unavailable_slot_is_preference() {
        let mut rules = SoftRules {
            max_consecutive_hours: 4,
            ..Default::default()
        };
        rules
            .unavailable
            .insert("T1".into(), [SlotRef { day: 0, period: 0 }].into_iter().collect());
        let conflicts = rules.check(&[session("s1", "T1", "R1", "G1", 0, 0)]);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_type, ConflictType::Preference);
        assert_eq!(conflicts[0].severity, Severity::Low);
    }

    #[test]
    fn test_session_on_no_class_day_is_constraint() {
        let rules = SoftRules {
            no_class_days: [2].into_iter().collect(),
            max_consecutive_hours: 4,
            ..Default::default()
        };
        let conflicts = rules.check(&[
            session("s1", "T1", "R1", "G1", 0, 0),
            session("s2", "T1", "R1", "G1", 2, 0),
        ]);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_type, ConflictType::Constraint);
        assert_eq!(conflicts[0].severity, Severity::Medium);
        assert!(conflicts[0].description.contains("no-class day"));
        assert!(conflicts[0].affected_session_ids.contains("s2"));
    }

    #[test]
    fn test_teacher_over_daily_limit() {
        let mut rules = SoftRules {
            max_consecutive_hours: 4,
            ..Default::default()
        };
        rules.teacher_limits.insert("T1".into(), (4, 3));
        let schedule = vec![
            session("s1", "T1", "R1", "G1", 0, 0),
            session("s2", "T1", "R1", "G2", 0, 2),
            session("s3", "T1", "R1", "G3", 0, 4),
            session("s4", "T1", "R1", "G4", 0, 6),
            session("s5", "T1", "R1", "G1", 1, 0),
        ];
        let conflicts = rules.check(&schedule);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_type, ConflictType::Constraint);
        assert!(conflicts[0].description.contains("teaches 4 periods on Monday (limit 3)"));
        assert_eq!(conflicts[0].affected_session_ids.len(), 4);
        assert!(!conflicts[0].affected_session_ids.contains("s5"));
    }

    #[test]
    fn test_teacher_specific_consecutive_limit() {
        let mut rules = SoftRules {
            max_consecutive_hours: 4,
            ..Default::default()
        };
        rules.teacher_limits.insert("T1".into(), (2, 8));
        rules.teacher_limits.insert("T2".into(), (4, 8));
        let schedule = vec![
            session("s1", "T1", "R1", "G1", 0, 0),
            session("s2", "T1", "R1", "G2", 0, 1),
            session("s3", "T1", "R1", "G3", 0, 2),
            session("s4", "T2", "R2", "G4", 0, 0),
            session("s5", "T2", "R2", "G5", 0, 1),
            session("s6", "T2", "R2", "G6", 0, 2),
        ];
        let conflicts = rules.check(&schedule);
        assert_eq!(conflicts.len(), 1);
        assert!(conflicts[0].description.starts_with("Teacher T1 has 3 consecutive periods"));
        assert_eq!(
            conflicts[0].affected_session_ids.iter().cloned().collect::<Vec<_>>(),
            vec!["s1", "s2", "s3"]
        );
    }

    #[test]
    fn test_still_conflicting_after_move() {
        let mut schedule = vec![
            session("s1", "T1", "R1", "G1", 0, 0),
            session("s2", "T1", "R2", "G2", 0, 0),
        ];
        let conflict = detect_conflicts(&schedule).remove(0);
        let rules = SoftRules::default();
        assert!(still_conflicting(&conflict, &schedule, &rules));
        schedule[1].time_slot.period = 1;
        assert!(!still_conflicting(&conflict, &schedule, &rules));
    }
}
