use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// Type aliases for clarity
pub type BranchId = String;
pub type TeacherId = String;
pub type SubjectId = String;
pub type RoomId = String;
pub type ClassGroupId = String;
pub type SessionId = String;

pub const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Maps a day name (case-insensitive) to its 0-based index, Monday first.
pub fn day_index(name: &str) -> Option<u8> {
    DAY_NAMES
        .iter()
        .position(|d| d.eq_ignore_ascii_case(name.trim()))
        .map(|i| i as u8)
}

pub fn day_name(day: u8) -> &'static str {
    DAY_NAMES.get(day as usize).copied().unwrap_or("Unknown")
}

/// An academic branch (programme) split into one or more class sections.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub id: BranchId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub total_students: u32,
    #[serde(default = "default_sections")]
    pub sections: u32,
}

fn default_sections() -> u32 {
    1
}

impl Branch {
    /// Class-group ids for every section: `"{id}-A"`, `"{id}-B"`, ...
    pub fn class_groups(&self) -> Vec<ClassGroupId> {
        (0..self.sections)
            .map(|i| format!("{}-{}", self.id, section_label(i)))
            .collect()
    }

    /// Students per section, rounded up.
    pub fn section_size(&self) -> u32 {
        if self.sections == 0 {
            return self.total_students;
        }
        self.total_students.div_ceil(self.sections)
    }
}

fn section_label(index: u32) -> String {
    let mut label = String::new();
    let mut n = index;
    loop {
        label.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    label
}

/// Identity of a time slot within the weekly grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct SlotRef {
    pub day: u8,
    pub period: u32,
}

impl fmt::Display for SlotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} period {}", day_name(self.day), self.period)
    }
}

/// A teacher with the subjects they are assigned to teach.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: TeacherId,
    #[serde(default)]
    pub name: String,
    pub subject_ids: Vec<SubjectId>,
    #[serde(default = "default_max_hours_per_day")]
    pub max_hours_per_day: u32,
    #[serde(default = "default_max_consecutive_hours")]
    pub max_consecutive_hours: u32,
    #[serde(default)]
    pub preferred_slots: Vec<SlotRef>,
    #[serde(default)]
    pub unavailable_slots: Vec<SlotRef>,
    #[serde(default)]
    pub preferred_rooms: Vec<RoomId>,
}

fn default_max_hours_per_day() -> u32 {
    8
}

pub(crate) fn default_max_consecutive_hours() -> u32 {
    4
}

/// A subject with its weekly contact-hour requirements for every class
/// group of its branch.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: SubjectId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    pub branch_id: BranchId,
    #[serde(default)]
    pub theory_hours: u32,
    #[serde(default)]
    pub practical_hours: u32,
    #[serde(default = "default_min_capacity")]
    pub min_capacity: u32,
    #[serde(default)]
    pub required_equipment: Vec<String>,
    #[serde(default)]
    pub can_be_online: bool,
    #[serde(default)]
    pub preferred_slots: Vec<SlotRef>,
}

fn default_min_capacity() -> u32 {
    30
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RoomType {
    Classroom,
    Laboratory,
    SeminarHall,
    Auditorium,
}

/// Represents a physical room with a given capacity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub room_type: RoomType,
    pub capacity: u32,
    #[serde(default)]
    pub equipment: Vec<String>,
    /// Session types this room may not host.
    #[serde(default)]
    pub restrictions: Vec<SessionType>,
    #[serde(default)]
    pub maintenance_slots: Vec<SlotRef>,
}

/// Day and time preferences the weekly grid is built from.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingPreferences {
    pub start_time: String,
    pub end_time: String,
    #[serde(default = "default_lunch_break")]
    pub lunch_break: String,
    pub working_days: Vec<String>,
    #[serde(default = "default_period_duration")]
    pub period_duration: u32,
    #[serde(default = "default_max_consecutive_hours")]
    pub max_consecutive_hours: u32,
    #[serde(default)]
    pub no_class_days: Vec<String>,
    #[serde(default)]
    pub priority_subjects: Vec<SubjectId>,
}

fn default_lunch_break() -> String {
    "13:00-14:00".to_string()
}

fn default_period_duration() -> u32 {
    60
}

/// The complete input for the timetabling problem.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionData {
    #[serde(default)]
    pub branches: Vec<Branch>,
    pub teachers: Vec<Teacher>,
    pub subjects: Vec<Subject>,
    pub rooms: Vec<Room>,
    pub preferences: SchedulingPreferences,
}

/// An atomic (day, period) unit of the weekly grid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub day: u8,
    pub period: u32,
    pub start_time: String,
    pub end_time: String,
    pub is_break: bool,
}

impl TimeSlot {
    pub fn slot_ref(&self) -> SlotRef {
        SlotRef {
            day: self.day,
            period: self.period,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionType {
    Theory,
    Practical,
    Lab,
    Tutorial,
}

impl SessionType {
    /// Room type a session of this kind must be placed in.
    pub fn required_room_type(self) -> RoomType {
        match self {
            SessionType::Practical | SessionType::Lab => RoomType::Laboratory,
            SessionType::Theory | SessionType::Tutorial => RoomType::Classroom,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionType::Theory => "theory",
            SessionType::Practical => "practical",
            SessionType::Lab => "lab",
            SessionType::Tutorial => "tutorial",
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scheduled occurrence of a subject.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub subject_id: SubjectId,
    pub teacher_id: TeacherId,
    pub room_id: RoomId,
    pub class_group_id: ClassGroupId,
    pub time_slot: TimeSlot,
    pub session_type: SessionType,
    pub duration_minutes: u32,
}

impl Session {
    pub fn slot_ref(&self) -> SlotRef {
        self.time_slot.slot_ref()
    }
}

/// An ordered collection of sessions.
pub type Schedule = Vec<Session>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConflictType {
    Teacher,
    Room,
    Class,
    Preference,
    Constraint,
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConflictType::Teacher => "teacher",
            ConflictType::Room => "room",
            ConflictType::Class => "class",
            ConflictType::Preference => "preference",
            ConflictType::Constraint => "constraint",
        };
        f.write_str(s)
    }
}

/// Conflict severity; the derived ordering runs low < medium < high < critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn multiplier(self) -> f64 {
        match self {
            Severity::Low => 0.5,
            Severity::Medium => 1.0,
            Severity::High => 2.0,
            Severity::Critical => 5.0,
        }
    }
}

/// A detected scheduling conflict.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictInfo {
    #[serde(rename = "type")]
    pub conflict_type: ConflictType,
    pub severity: Severity,
    pub description: String,
    pub affected_session_ids: BTreeSet<SessionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_method: Option<String>,
}

impl ConflictInfo {
    pub fn new(
        conflict_type: ConflictType,
        severity: Severity,
        description: impl Into<String>,
        affected_session_ids: impl IntoIterator<Item = SessionId>,
    ) -> Self {
        Self {
            conflict_type,
            severity,
            description: description.into(),
            affected_session_ids: affected_session_ids.into_iter().collect(),
            suggested_fix: None,
            resolved: false,
            resolution_method: None,
        }
    }

    pub fn with_suggested_fix(mut self, fix: impl Into<String>) -> Self {
        self.suggested_fix = Some(fix.into());
        self
    }
}

impl fmt::Display for ConflictInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{:?}] {}", self.conflict_type, self.severity, self.description)
    }
}

/// A required teaching hour that could not be placed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnscheduledHour {
    pub subject_id: SubjectId,
    pub class_group_id: ClassGroupId,
    pub session_type: SessionType,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionSummary {
    pub total_conflicts: usize,
    pub resolved_conflicts: usize,
    pub resolution_rate: f64,
    pub resolution_methods: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_sessions: usize,
    pub conflicts_resolved: usize,
    pub teacher_utilization: f64,
    pub room_utilization: f64,
    /// Sessions per weekday, Monday first.
    pub time_distribution: [usize; 7],
    pub average_gaps_between_classes: f64,
    pub unscheduled_hours: usize,
}

/// The final output of a generation run.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    pub schedule: Schedule,
    /// Conflicts that remain unresolved.
    pub conflicts: Vec<ConflictInfo>,
    pub resolved_conflicts: Vec<ConflictInfo>,
    pub optimization_score: f64,
    pub iterations: usize,
    pub convergence_reached: bool,
    pub resolution_summary: ResolutionSummary,
    pub statistics: Statistics,
    pub unscheduled: Vec<UnscheduledHour>,
}
