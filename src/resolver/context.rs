//! Read-only data consulted by resolution strategies.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::data::{
    ClassGroupId, InstitutionData, RoomId, RoomType, SessionType, SlotRef, SubjectId, TeacherId,
    TimeSlot, day_index,
};
use crate::detector::SoftRules;
use crate::grid::{parse_lunch_window, parse_time};

#[derive(Debug, Clone, PartialEq)]
pub struct TeacherPreference {
    pub teacher_id: TeacherId,
    pub preferred_slots: HashSet<SlotRef>,
    pub unavailable_slots: HashSet<SlotRef>,
    pub max_consecutive_hours: u32,
    pub max_daily_hours: u32,
    pub preferred_rooms: Vec<RoomId>,
    /// Subjects this teacher is assigned to.
    pub specializations: HashSet<SubjectId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubjectRequirement {
    pub subject_id: SubjectId,
    pub min_capacity: u32,
    pub required_equipment: Vec<String>,
    pub can_be_scheduled_online: bool,
    pub preferred_slots: HashSet<SlotRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoomProfile {
    pub capacity: u32,
    pub room_type: RoomType,
    pub equipment: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomBookingRule {
    /// Session types the room may not host.
    pub restrictions: Vec<SessionType>,
    pub maintenance_slots: HashSet<SlotRef>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstitutionConstraints {
    pub max_consecutive_hours: u32,
    /// Minute ranges in which no session may start.
    pub mandatory_breaks: Vec<(u32, u32)>,
    pub no_class_days: HashSet<u8>,
    pub priority_subjects: HashSet<SubjectId>,
    pub room_booking_rules: HashMap<RoomId, RoomBookingRule>,
}

/// Everything a strategy may look up while proposing a fix. Ordered maps
/// keep candidate selection deterministic.
#[derive(Debug, Clone, Default)]
pub struct ResolutionContext {
    /// Slots a session may be moved into: no breaks, no no-class days.
    pub available_time_slots: Vec<TimeSlot>,
    pub teacher_preferences: BTreeMap<TeacherId, TeacherPreference>,
    pub subject_requirements: HashMap<SubjectId, SubjectRequirement>,
    pub rooms: BTreeMap<RoomId, RoomProfile>,
    pub class_group_sizes: HashMap<ClassGroupId, u32>,
    pub institution_constraints: InstitutionConstraints,
}

impl ResolutionContext {
    pub fn from_institution(data: &InstitutionData, slots: &[TimeSlot]) -> Self {
        let teacher_preferences = data
            .teachers
            .iter()
            .map(|t| {
                let pref = TeacherPreference {
                    teacher_id: t.id.clone(),
                    preferred_slots: t.preferred_slots.iter().copied().collect(),
                    unavailable_slots: t.unavailable_slots.iter().copied().collect(),
                    max_consecutive_hours: t.max_consecutive_hours,
                    max_daily_hours: t.max_hours_per_day,
                    preferred_rooms: t.preferred_rooms.clone(),
                    specializations: t.subject_ids.iter().cloned().collect(),
                };
                (t.id.clone(), pref)
            })
            .collect();

        let subject_requirements = data
            .subjects
            .iter()
            .map(|s| {
                let req = SubjectRequirement {
                    subject_id: s.id.clone(),
                    min_capacity: s.min_capacity,
                    required_equipment: s.required_equipment.clone(),
                    can_be_scheduled_online: s.can_be_online,
                    preferred_slots: s.preferred_slots.iter().copied().collect(),
                };
                (s.id.clone(), req)
            })
            .collect();

        let rooms = data
            .rooms
            .iter()
            .map(|r| {
                let profile = RoomProfile {
                    capacity: r.capacity,
                    room_type: r.room_type,
                    equipment: r.equipment.clone(),
                };
                (r.id.clone(), profile)
            })
            .collect();

        let class_group_sizes = data
            .branches
            .iter()
            .flat_map(|b| {
                let size = b.section_size();
                b.class_groups().into_iter().map(move |g| (g, size))
            })
            .collect();

        let prefs = &data.preferences;
        let institution_constraints = InstitutionConstraints {
            max_consecutive_hours: prefs.max_consecutive_hours,
            mandatory_breaks: parse_lunch_window(&prefs.lunch_break).into_iter().collect(),
            no_class_days: prefs.no_class_days.iter().filter_map(|d| day_index(d)).collect(),
            priority_subjects: prefs.priority_subjects.iter().cloned().collect(),
            room_booking_rules: data
                .rooms
                .iter()
                .map(|r| {
                    let rule = RoomBookingRule {
                        restrictions: r.restrictions.clone(),
                        maintenance_slots: r.maintenance_slots.iter().copied().collect(),
                    };
                    (r.id.clone(), rule)
                })
                .collect(),
        };

        let mut context = Self {
            available_time_slots: Vec::new(),
            teacher_preferences,
            subject_requirements,
            rooms,
            class_group_sizes,
            institution_constraints,
        };
        context.available_time_slots = slots
            .iter()
            .filter(|s| context.is_open(s))
            .cloned()
            .collect();
        context
    }

    fn is_open(&self, slot: &TimeSlot) -> bool {
        let constraints = &self.institution_constraints;
        if slot.is_break || constraints.no_class_days.contains(&slot.day) {
            return false;
        }
        let start = parse_time(&slot.start_time).unwrap_or(0);
        !constraints
            .mandatory_breaks
            .iter()
            .any(|&(from, to)| start >= from && start < to)
    }

    /// Seats a session of this subject and class group needs.
    pub fn required_capacity(&self, subject_id: &str, class_group_id: &str) -> u32 {
        let subject_min = self
            .subject_requirements
            .get(subject_id)
            .map_or(0, |r| r.min_capacity);
        let group_size = self.class_group_sizes.get(class_group_id).copied().unwrap_or(0);
        subject_min.max(group_size)
    }

    /// 5, plus 3 for a priority subject, plus 2 for a lab or practical
    /// session. Higher means harder to move.
    pub fn session_priority(&self, subject_id: &str, session_type: SessionType) -> i32 {
        let mut priority = 5;
        if self.institution_constraints.priority_subjects.contains(subject_id) {
            priority += 3;
        }
        if matches!(session_type, SessionType::Lab | SessionType::Practical) {
            priority += 2;
        }
        priority
    }

    /// Soft rules (availability, no-class days, hour limits) drawn from
    /// this context.
    pub fn soft_rules(&self) -> SoftRules {
        SoftRules::new(
            self.teacher_preferences
                .values()
                .map(|p| (p.teacher_id.clone(), p.unavailable_slots.clone()))
                .collect(),
            self.teacher_preferences
                .values()
                .map(|p| (p.teacher_id.clone(), (p.max_consecutive_hours, p.max_daily_hours)))
                .collect(),
            self.institution_constraints.no_class_days.clone(),
            self.institution_constraints.max_consecutive_hours,
        )
    }
}
