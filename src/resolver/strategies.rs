//! Built-in resolution strategies.
//!
//! Every strategy is stateless: it inspects the conflict, the current
//! working schedule and the context, and proposes modified sessions without
//! touching the schedule itself.

use crate::data::{ConflictInfo, ConflictType, Session, SessionType, TimeSlot, day_name};
use crate::error::StrategyError;

use super::context::ResolutionContext;

/// Periods before this index count as morning.
const MORNING_PERIODS: u32 = 4;

/// A typed repair procedure tried by the resolution engine in priority
/// order.
pub trait ResolutionStrategy: Send + Sync {
    fn id(&self) -> &'static str;
    fn name(&self) -> &'static str;
    /// Higher runs first.
    fn priority(&self) -> i32;
    fn applicable_conflict_types(&self) -> &'static [ConflictType];
    fn resolve(
        &self,
        conflict: &ConflictInfo,
        schedule: &[Session],
        context: &ResolutionContext,
    ) -> Result<ResolutionResult, StrategyError>;
}

/// A different fix the caller could pick instead of the applied one.
#[derive(Debug, Clone, PartialEq)]
pub struct AlternativeSolution {
    pub description: String,
    pub modified_sessions: Vec<Session>,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub feasibility_score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionResult {
    pub success: bool,
    pub modified_sessions: Vec<Session>,
    pub alternative_solutions: Vec<AlternativeSolution>,
    pub explanation: String,
    /// In `[0, 1]`.
    pub confidence: f64,
    /// Lower is less disruptive.
    pub impact_score: f64,
}

impl ResolutionResult {
    pub fn failure(explanation: impl Into<String>) -> Self {
        Self {
            success: false,
            modified_sessions: Vec::new(),
            alternative_solutions: Vec::new(),
            explanation: explanation.into(),
            confidence: 0.0,
            impact_score: 0.0,
        }
    }

    fn applied(
        modified: Session,
        alternatives: Vec<AlternativeSolution>,
        explanation: String,
        confidence: f64,
    ) -> Self {
        let modified_sessions = vec![modified];
        Self {
            impact_score: impact_score(&modified_sessions),
            success: true,
            modified_sessions,
            alternative_solutions: alternatives,
            explanation,
            confidence,
        }
    }

    fn acknowledged(explanation: &str, confidence: f64, impact_score: f64) -> Self {
        Self {
            success: true,
            modified_sessions: Vec::new(),
            alternative_solutions: Vec::new(),
            explanation: explanation.to_string(),
            confidence,
            impact_score,
        }
    }
}

fn impact_score(modified: &[Session]) -> f64 {
    modified.len() as f64 * 2.0
}

/// The standard catalogue, in registration order.
pub fn default_strategies() -> Vec<Box<dyn ResolutionStrategy>> {
    vec![
        Box::new(TeacherTimeShift),
        Box::new(TeacherSubstitute),
        Box::new(RoomReallocation),
        Box::new(RoomCapacitySplit),
        Box::new(ClassReschedule),
        Box::new(PreferenceAcknowledgement),
        Box::new(ConstraintAcknowledgement),
    ]
}

/// The affected sessions, in schedule order. Errors when an affected id is
/// no longer in the schedule.
fn conflicting_sessions<'s>(
    conflict: &ConflictInfo,
    schedule: &'s [Session],
) -> Result<Vec<&'s Session>, StrategyError> {
    let found: Vec<&Session> = schedule
        .iter()
        .filter(|s| conflict.affected_session_ids.contains(&s.id))
        .collect();
    if let Some(missing) = conflict
        .affected_session_ids
        .iter()
        .find(|id| !found.iter().any(|s| &s.id == *id))
    {
        return Err(StrategyError::MissingSession(missing.clone()));
    }
    Ok(found)
}

/// The session with the lowest priority; the first one wins ties.
fn select_session_to_move<'s>(sessions: &[&'s Session], context: &ResolutionContext) -> Option<&'s Session> {
    sessions
        .iter()
        .copied()
        .min_by_key(|s| context.session_priority(&s.subject_id, s.session_type))
}

fn occupied_by(schedule: &[Session], slot: &TimeSlot, mut matches: impl FnMut(&Session) -> bool) -> bool {
    schedule
        .iter()
        .any(|s| s.time_slot.day == slot.day && s.time_slot.period == slot.period && matches(s))
}

fn describe_slot(slot: &TimeSlot) -> String {
    format!("{}-{} on {}", slot.start_time, slot.end_time, day_name(slot.day))
}

/// Moves the lowest-priority affected session to the best open slot for its
/// teacher. With `guard_class_group` set, slots where the class group is
/// already busy are excluded as well.
fn shift_in_time(
    conflict: &ConflictInfo,
    schedule: &[Session],
    context: &ResolutionContext,
    guard_class_group: bool,
) -> Result<ResolutionResult, StrategyError> {
    let sessions = conflicting_sessions(conflict, schedule)?;
    if sessions.len() < 2 {
        return Ok(ResolutionResult::failure("Insufficient conflicting sessions"));
    }
    let Some(session) = select_session_to_move(&sessions, context) else {
        return Ok(ResolutionResult::failure("Insufficient conflicting sessions"));
    };
    let teacher = context.teacher_preferences.get(&session.teacher_id);
    let subject = context.subject_requirements.get(&session.subject_id);

    let open: Vec<&TimeSlot> = context
        .available_time_slots
        .iter()
        .filter(|slot| {
            teacher.is_none_or(|t| !t.unavailable_slots.contains(&slot.slot_ref()))
                && !occupied_by(schedule, slot, |s| s.teacher_id == session.teacher_id)
                && !(guard_class_group
                    && occupied_by(schedule, slot, |s| s.class_group_id == session.class_group_id))
        })
        .collect();

    if open.is_empty() {
        return Ok(ResolutionResult::failure("No available time slots for teacher"));
    }

    let score = |slot: &TimeSlot| {
        let key = slot.slot_ref();
        let mut score = 0;
        if teacher.is_some_and(|t| t.preferred_slots.contains(&key))
            || subject.is_some_and(|r| r.preferred_slots.contains(&key))
        {
            score += 10;
        }
        if session.session_type == SessionType::Theory && slot.period < MORNING_PERIODS {
            score += 5;
        }
        if occupied_by(schedule, slot, |s| {
            s.id != session.id && (s.class_group_id == session.class_group_id || s.room_id == session.room_id)
        }) {
            score -= 20;
        }
        score
    };
    let mut ranked: Vec<(i32, &TimeSlot)> = open.into_iter().map(|slot| (score(slot), slot)).collect();
    // stable: equal scores keep grid order
    ranked.sort_by(|a, b| b.0.cmp(&a.0));

    let best = ranked[0].1;
    let moved = Session {
        time_slot: best.clone(),
        ..session.clone()
    };
    let alternatives = ranked[1..]
        .iter()
        .take(3)
        .map(|(_, slot)| AlternativeSolution {
            description: format!("Schedule at {}", describe_slot(slot)),
            modified_sessions: vec![Session {
                time_slot: (*slot).clone(),
                ..session.clone()
            }],
            pros: vec!["Available time slot".into(), "No teacher conflict".into()],
            cons: vec!["May not be optimal time".into()],
            feasibility_score: 0.7,
        })
        .collect();

    Ok(ResolutionResult::applied(
        moved,
        alternatives,
        format!(
            "Moved {} ({}) to {}",
            session.id,
            session.subject_id,
            describe_slot(best)
        ),
        0.85,
    ))
}

pub struct TeacherTimeShift;

impl ResolutionStrategy for TeacherTimeShift {
    fn id(&self) -> &'static str {
        "teacher_conflict_time_shift"
    }

    fn name(&self) -> &'static str {
        "Teacher Conflict - Time Shift"
    }

    fn priority(&self) -> i32 {
        9
    }

    fn applicable_conflict_types(&self) -> &'static [ConflictType] {
        &[ConflictType::Teacher]
    }

    fn resolve(
        &self,
        conflict: &ConflictInfo,
        schedule: &[Session],
        context: &ResolutionContext,
    ) -> Result<ResolutionResult, StrategyError> {
        shift_in_time(conflict, schedule, context, false)
    }
}

/// Hands the session to another teacher assigned to the same subject who
/// is free in that slot.
pub struct TeacherSubstitute;

impl ResolutionStrategy for TeacherSubstitute {
    fn id(&self) -> &'static str {
        "teacher_conflict_substitute"
    }

    fn name(&self) -> &'static str {
        "Teacher Conflict - Substitute Assignment"
    }

    fn priority(&self) -> i32 {
        7
    }

    fn applicable_conflict_types(&self) -> &'static [ConflictType] {
        &[ConflictType::Teacher]
    }

    fn resolve(
        &self,
        conflict: &ConflictInfo,
        schedule: &[Session],
        context: &ResolutionContext,
    ) -> Result<ResolutionResult, StrategyError> {
        let sessions = conflicting_sessions(conflict, schedule)?;
        let Some(session) = select_session_to_move(&sessions, context) else {
            return Ok(ResolutionResult::failure("Insufficient conflicting sessions"));
        };
        let slot = session.slot_ref();

        let qualified: Vec<&str> = context
            .teacher_preferences
            .values()
            .filter(|t| {
                t.teacher_id != session.teacher_id
                    && t.specializations.contains(&session.subject_id)
                    && !t.unavailable_slots.contains(&slot)
                    && !occupied_by(schedule, &session.time_slot, |s| s.teacher_id == t.teacher_id)
            })
            .map(|t| t.teacher_id.as_str())
            .collect();

        let Some((&substitute, others)) = qualified.split_first() else {
            return Ok(ResolutionResult::failure("No qualified substitute teachers available"));
        };

        let alternatives = others
            .iter()
            .take(2)
            .map(|&teacher_id| AlternativeSolution {
                description: format!("Assign to {teacher_id}"),
                modified_sessions: vec![Session {
                    teacher_id: teacher_id.to_string(),
                    ..session.clone()
                }],
                pros: vec!["Available teacher".into(), "Qualified for subject".into()],
                cons: vec!["May not be preferred teacher".into()],
                feasibility_score: 0.7,
            })
            .collect();

        Ok(ResolutionResult::applied(
            Session {
                teacher_id: substitute.to_string(),
                ..session.clone()
            },
            alternatives,
            format!("Assigned substitute teacher {substitute} to {}", session.id),
            0.75,
        ))
    }
}

/// Moves the session to another free room of the right type and size.
pub struct RoomReallocation;

impl ResolutionStrategy for RoomReallocation {
    fn id(&self) -> &'static str {
        "room_conflict_reallocation"
    }

    fn name(&self) -> &'static str {
        "Room Conflict - Reallocation"
    }

    fn priority(&self) -> i32 {
        8
    }

    fn applicable_conflict_types(&self) -> &'static [ConflictType] {
        &[ConflictType::Room]
    }

    fn resolve(
        &self,
        conflict: &ConflictInfo,
        schedule: &[Session],
        context: &ResolutionContext,
    ) -> Result<ResolutionResult, StrategyError> {
        let sessions = conflicting_sessions(conflict, schedule)?;
        let Some(session) = select_session_to_move(&sessions, context) else {
            return Ok(ResolutionResult::failure("Insufficient conflicting sessions"));
        };
        let slot = session.slot_ref();
        let required_capacity = context.required_capacity(&session.subject_id, &session.class_group_id);
        let required_type = session.session_type.required_room_type();
        let equipment = context
            .subject_requirements
            .get(&session.subject_id)
            .map(|r| r.required_equipment.as_slice())
            .unwrap_or(&[]);
        let rules = &context.institution_constraints.room_booking_rules;

        let mut rooms: Vec<&str> = context
            .rooms
            .iter()
            .filter(|(room_id, room)| {
                let rule = rules.get(*room_id);
                **room_id != session.room_id
                    && room.capacity >= required_capacity
                    && room.room_type == required_type
                    && equipment.iter().all(|e| room.equipment.contains(e))
                    && !rule.is_some_and(|r| r.restrictions.contains(&session.session_type))
                    && !rule.is_some_and(|r| r.maintenance_slots.contains(&slot))
                    && !occupied_by(schedule, &session.time_slot, |s| &s.room_id == *room_id)
            })
            .map(|(room_id, _)| room_id.as_str())
            .collect();

        // the teacher's preferred rooms first, otherwise id order
        if let Some(teacher) = context.teacher_preferences.get(&session.teacher_id) {
            rooms.sort_by_key(|r| !teacher.preferred_rooms.iter().any(|p| p.as_str() == *r));
        }

        let Some((&room, others)) = rooms.split_first() else {
            return Ok(ResolutionResult::failure("No suitable alternative rooms available"));
        };

        let alternatives = others
            .iter()
            .take(2)
            .map(|&room_id| AlternativeSolution {
                description: format!("Move to room {room_id}"),
                modified_sessions: vec![Session {
                    room_id: room_id.to_string(),
                    ..session.clone()
                }],
                pros: vec!["Available room".into(), "Meets capacity requirements".into()],
                cons: vec!["May be in a different building".into()],
                feasibility_score: 0.8,
            })
            .collect();

        Ok(ResolutionResult::applied(
            Session {
                room_id: room.to_string(),
                ..session.clone()
            },
            alternatives,
            format!("Moved {} to room {room}", session.id),
            0.9,
        ))
    }
}

/// Splitting a class across two rooms is not supported; this strategy is
/// registered so the gap shows up in resolution reports.
pub struct RoomCapacitySplit;

impl ResolutionStrategy for RoomCapacitySplit {
    fn id(&self) -> &'static str {
        "room_conflict_capacity_split"
    }

    fn name(&self) -> &'static str {
        "Room Conflict - Capacity Split"
    }

    fn priority(&self) -> i32 {
        6
    }

    fn applicable_conflict_types(&self) -> &'static [ConflictType] {
        &[ConflictType::Room]
    }

    fn resolve(
        &self,
        _conflict: &ConflictInfo,
        _schedule: &[Session],
        _context: &ResolutionContext,
    ) -> Result<ResolutionResult, StrategyError> {
        Ok(ResolutionResult::failure(
            "Capacity splitting is not supported; add sections to the branch instead",
        ))
    }
}

pub struct ClassReschedule;

impl ResolutionStrategy for ClassReschedule {
    fn id(&self) -> &'static str {
        "class_conflict_reschedule"
    }

    fn name(&self) -> &'static str {
        "Class Conflict - Reschedule"
    }

    fn priority(&self) -> i32 {
        9
    }

    fn applicable_conflict_types(&self) -> &'static [ConflictType] {
        &[ConflictType::Class]
    }

    fn resolve(
        &self,
        conflict: &ConflictInfo,
        schedule: &[Session],
        context: &ResolutionContext,
    ) -> Result<ResolutionResult, StrategyError> {
        shift_in_time(conflict, schedule, context, true)
    }
}

/// Soft preference violations are acknowledged, not repaired.
pub struct PreferenceAcknowledgement;

impl ResolutionStrategy for PreferenceAcknowledgement {
    fn id(&self) -> &'static str {
        "preference_violation_optimization"
    }

    fn name(&self) -> &'static str {
        "Preference Violation - Optimization"
    }

    fn priority(&self) -> i32 {
        5
    }

    fn applicable_conflict_types(&self) -> &'static [ConflictType] {
        &[ConflictType::Preference]
    }

    fn resolve(
        &self,
        _conflict: &ConflictInfo,
        _schedule: &[Session],
        _context: &ResolutionContext,
    ) -> Result<ResolutionResult, StrategyError> {
        Ok(ResolutionResult::acknowledged(
            "Preference violation accepted as a soft constraint",
            0.6,
            1.0,
        ))
    }
}

pub struct ConstraintAcknowledgement;

impl ResolutionStrategy for ConstraintAcknowledgement {
    fn id(&self) -> &'static str {
        "constraint_violation_adaptive"
    }

    fn name(&self) -> &'static str {
        "Constraint Violation - Adaptive Resolution"
    }

    fn priority(&self) -> i32 {
        8
    }

    fn applicable_conflict_types(&self) -> &'static [ConflictType] {
        &[ConflictType::Constraint]
    }

    fn resolve(
        &self,
        _conflict: &ConflictInfo,
        _schedule: &[Session],
        _context: &ResolutionContext,
    ) -> Result<ResolutionResult, StrategyError> {
        Ok(ResolutionResult::acknowledged(
            "Constraint violation accepted through adaptive scheduling",
            0.7,
            2.0,
        ))
    }
}
