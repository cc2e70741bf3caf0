//! Random candidate schedules.
//!
//! Every required teaching hour becomes one session. Placement is a best
//! effort: an hour with no qualifying teacher, room, or free slot is left
//! out of the candidate and reported as unscheduled instead of failing the
//! run. Sessions are only placed in open slots: never a break, never on a
//! no-class day.

use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use log::trace;
use rand::Rng;
use rand::prelude::IndexedRandom;

use crate::data::{
    ClassGroupId, InstitutionData, Room, Schedule, Session, SessionId, SessionType, SlotRef,
    SubjectId, Teacher, TimeSlot, UnscheduledHour, day_index,
};

/// One teaching hour that a candidate schedule should contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub subject_id: SubjectId,
    pub class_group_id: ClassGroupId,
    pub session_type: SessionType,
    /// 1-based index among the hours of this subject, group and type.
    pub ordinal: u32,
}

impl Requirement {
    /// Stable session id, identical across every candidate in a run.
    pub fn session_id(&self) -> SessionId {
        format!(
            "{}-{}-{}-{}",
            self.subject_id, self.class_group_id, self.session_type, self.ordinal
        )
    }
}

/// A freshly generated schedule plus the hours it failed to place.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub sessions: Schedule,
    pub unscheduled: Vec<UnscheduledHour>,
}

/// Builds random candidate schedules from the institution data.
pub struct CandidateGenerator<'a> {
    open_slots: Vec<&'a TimeSlot>,
    requirements: Vec<Requirement>,
    teachers_by_subject: HashMap<&'a str, Vec<&'a Teacher>>,
    rooms: &'a [Room],
    period_duration: u32,
}

impl<'a> CandidateGenerator<'a> {
    pub fn new(data: &'a InstitutionData, slots: &'a [TimeSlot]) -> Self {
        let class_groups: HashMap<&str, Vec<ClassGroupId>> = data
            .branches
            .iter()
            .map(|b| (b.id.as_str(), b.class_groups()))
            .collect();

        let teachers_by_subject: HashMap<&str, Vec<&Teacher>> = data
            .teachers
            .iter()
            .flat_map(|t| t.subject_ids.iter().map(move |s| (s.as_str(), t)))
            .into_group_map();

        let mut requirements = Vec::new();
        for subject in &data.subjects {
            let Some(groups) = class_groups.get(subject.branch_id.as_str()) else {
                continue;
            };
            for group in groups {
                let hours = (1..=subject.theory_hours)
                    .map(|n| (SessionType::Theory, n))
                    .chain((1..=subject.practical_hours).map(|n| (SessionType::Practical, n)));
                for (session_type, ordinal) in hours {
                    requirements.push(Requirement {
                        subject_id: subject.id.clone(),
                        class_group_id: group.clone(),
                        session_type,
                        ordinal,
                    });
                }
            }
        }

        let no_class_days: HashSet<u8> = data
            .preferences
            .no_class_days
            .iter()
            .filter_map(|d| day_index(d))
            .collect();
        let open_slots = slots
            .iter()
            .filter(|s| !s.is_break && !no_class_days.contains(&s.day))
            .collect();

        Self {
            open_slots,
            requirements,
            teachers_by_subject,
            rooms: &data.rooms,
            period_duration: data.preferences.period_duration,
        }
    }

    /// All required hours, in generation order.
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Slots a session may be placed in.
    pub fn open_slots(&self) -> &[&'a TimeSlot] {
        &self.open_slots
    }

    fn qualified_teachers(&self, subject_id: &str) -> &[&'a Teacher] {
        self.teachers_by_subject
            .get(subject_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn matching_rooms(&self, session_type: SessionType) -> Vec<&'a Room> {
        let wanted = session_type.required_room_type();
        self.rooms.iter().filter(|r| r.room_type == wanted).collect()
    }

    /// Why a requirement cannot be placed, judged from the static input only.
    pub fn diagnose(&self, req: &Requirement) -> String {
        if self.qualified_teachers(&req.subject_id).is_empty() {
            format!("no teacher is assigned to subject {}", req.subject_id)
        } else if self.matching_rooms(req.session_type).is_empty() {
            format!(
                "no {:?} room available for a {} session",
                req.session_type.required_room_type(),
                req.session_type
            )
        } else {
            "no free time slot for the chosen teacher and room".to_string()
        }
    }

    /// Produces one random candidate.
    pub fn generate<R: Rng>(&self, rng: &mut R) -> Candidate {
        let mut sessions = Vec::with_capacity(self.requirements.len());
        let mut unscheduled = Vec::new();
        let mut used: HashSet<(SlotRef, &str, &str)> = HashSet::new();

        for req in &self.requirements {
            let Some(teacher) = self.qualified_teachers(&req.subject_id).choose(rng) else {
                unscheduled.push(self.unscheduled(req));
                continue;
            };
            let Some(room) = self.matching_rooms(req.session_type).choose(rng).copied() else {
                unscheduled.push(self.unscheduled(req));
                continue;
            };
            let free: Vec<&TimeSlot> = self
                .open_slots
                .iter()
                .copied()
                .filter(|s| !used.contains(&(s.slot_ref(), teacher.id.as_str(), room.id.as_str())))
                .collect();
            let Some(slot) = free.choose(rng) else {
                unscheduled.push(self.unscheduled(req));
                continue;
            };

            used.insert((slot.slot_ref(), teacher.id.as_str(), room.id.as_str()));
            sessions.push(Session {
                id: req.session_id(),
                subject_id: req.subject_id.clone(),
                teacher_id: teacher.id.clone(),
                room_id: room.id.clone(),
                class_group_id: req.class_group_id.clone(),
                time_slot: (*slot).clone(),
                session_type: req.session_type,
                duration_minutes: self.period_duration,
            });
        }

        trace!(
            "Generated candidate with {} sessions, {} unscheduled",
            sessions.len(),
            unscheduled.len()
        );
        Candidate {
            sessions,
            unscheduled,
        }
    }

    fn unscheduled(&self, req: &Requirement) -> UnscheduledHour {
        UnscheduledHour {
            subject_id: req.subject_id.clone(),
            class_group_id: req.class_group_id.clone(),
            session_type: req.session_type,
            reason: self.diagnose(req),
        }
    }

    /// Required hours with no session in `schedule`.
    pub fn missing_from(&self, schedule: &[Session]) -> Vec<UnscheduledHour> {
        let placed: HashSet<&str> = schedule.iter().map(|s| s.id.as_str()).collect();
        self.requirements
            .iter()
            .filter(|r| !placed.contains(r.session_id().as_str()))
            .map(|r| self.unscheduled(r))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::{Branch, RoomType, SchedulingPreferences, Subject};
    use crate::grid::build_time_grid;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    pub(crate) fn teacher(id: &str, subjects: &[&str]) -> Teacher {
        Teacher {
            id: id.into(),
            name: id.into(),
            subject_ids: subjects.iter().map(|s| s.to_string()).collect(),
            max_hours_per_day: 8,
            max_consecutive_hours: 4,
            preferred_slots: vec![],
            unavailable_slots: vec![],
            preferred_rooms: vec![],
        }
    }

    pub(crate) fn room(id: &str, room_type: RoomType, capacity: u32) -> Room {
        Room {
            id: id.into(),
            name: id.into(),
            room_type,
            capacity,
            equipment: vec![],
            restrictions: vec![],
            maintenance_slots: vec![],
        }
    }

    pub(crate) fn subject(id: &str, branch: &str, theory: u32, practical: u32) -> Subject {
        Subject {
            id: id.into(),
            name: id.into(),
            code: id.into(),
            branch_id: branch.into(),
            theory_hours: theory,
            practical_hours: practical,
            min_capacity: 30,
            required_equipment: vec![],
            can_be_online: false,
            preferred_slots: vec![],
        }
    }

    pub(crate) fn branch(id: &str, sections: u32) -> Branch {
        Branch {
            id: id.into(),
            name: id.into(),
            code: id.into(),
            total_students: 30 * sections,
            sections,
        }
    }

    pub(crate) fn institution() -> InstitutionData {
        InstitutionData {
            branches: vec![branch("CS", 2)],
            teachers: vec![teacher("T1", &["ALG", "PHY"]), teacher("T2", &["PHY"])],
            subjects: vec![subject("ALG", "CS", 3, 0), subject("PHY", "CS", 2, 2)],
            rooms: vec![
                room("R1", RoomType::Classroom, 60),
                room("R2", RoomType::Classroom, 60),
                room("L1", RoomType::Laboratory, 40),
            ],
            preferences: SchedulingPreferences {
                start_time: "09:00".into(),
                end_time: "17:00".into(),
                lunch_break: "13:00-14:00".into(),
                working_days: vec!["Monday".into(), "Tuesday".into(), "Wednesday".into()],
                period_duration: 60,
                max_consecutive_hours: 4,
                no_class_days: vec![],
                priority_subjects: vec![],
            },
        }
    }

    #[test]
    fn test_requirements_expand_per_class_group() {
        let data = institution();
        let slots = build_time_grid(&data.preferences).unwrap();
        let generator = CandidateGenerator::new(&data, &slots);
        // (3 + 2 + 2) hours x 2 sections
        assert_eq!(generator.requirements().len(), 14);
        assert_eq!(generator.requirements()[0].session_id(), "ALG-CS-A-theory-1");
        assert_eq!(generator.requirements()[3].class_group_id, "CS-B");
    }

    #[test]
    fn test_generate_places_every_feasible_hour() {
        let data = institution();
        let slots = build_time_grid(&data.preferences).unwrap();
        let generator = CandidateGenerator::new(&data, &slots);
        let mut rng = SmallRng::seed_from_u64(7);
        let candidate = generator.generate(&mut rng);

        assert_eq!(candidate.sessions.len(), 14);
        assert!(candidate.unscheduled.is_empty());
        for s in &candidate.sessions {
            assert!(!s.time_slot.is_break);
            let room = data.rooms.iter().find(|r| r.id == s.room_id).unwrap();
            assert_eq!(room.room_type, s.session_type.required_room_type());
            let teacher = data.teachers.iter().find(|t| t.id == s.teacher_id).unwrap();
            assert!(teacher.subject_ids.contains(&s.subject_id));
        }
    }

    #[test]
    fn test_missing_lab_skips_practical_hours() {
        let mut data = institution();
        data.rooms.retain(|r| r.room_type != RoomType::Laboratory);
        let slots = build_time_grid(&data.preferences).unwrap();
        let generator = CandidateGenerator::new(&data, &slots);
        let mut rng = SmallRng::seed_from_u64(1);
        let candidate = generator.generate(&mut rng);

        assert_eq!(candidate.unscheduled.len(), 4);
        assert!(candidate.unscheduled.iter().all(|u| u.session_type == SessionType::Practical));
        assert!(candidate.unscheduled[0].reason.contains("Laboratory"));
        assert_eq!(generator.missing_from(&candidate.sessions), candidate.unscheduled);
    }

    #[test]
    fn test_unassigned_subject_is_unscheduled() {
        let mut data = institution();
        data.subjects.push(subject("BIO", "CS", 1, 0));
        let slots = build_time_grid(&data.preferences).unwrap();
        let generator = CandidateGenerator::new(&data, &slots);
        let candidate = generator.generate(&mut SmallRng::seed_from_u64(3));
        assert_eq!(candidate.unscheduled.len(), 2);
        assert!(candidate.unscheduled[0].reason.contains("no teacher"));
    }

    #[test]
    fn test_no_class_day_never_used() {
        let mut data = institution();
        data.preferences.no_class_days = vec!["Tuesday".into()];
        let slots = build_time_grid(&data.preferences).unwrap();
        let generator = CandidateGenerator::new(&data, &slots);
        // 3 days x 7 teaching periods, minus Tuesday
        assert_eq!(generator.open_slots().len(), 14);

        for seed in 0..20 {
            let candidate = generator.generate(&mut SmallRng::seed_from_u64(seed));
            assert_eq!(candidate.sessions.len(), 14);
            assert!(candidate.sessions.iter().all(|s| s.time_slot.day != 1));
        }
    }

    #[test]
    fn test_same_seed_same_candidate() {
        let data = institution();
        let slots = build_time_grid(&data.preferences).unwrap();
        let generator = CandidateGenerator::new(&data, &slots);
        let a = generator.generate(&mut SmallRng::seed_from_u64(99));
        let b = generator.generate(&mut SmallRng::seed_from_u64(99));
        assert_eq!(a.sessions, b.sessions);
    }
}
