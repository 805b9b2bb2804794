use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use uuid::Uuid;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq, Ord,
            PartialOrd, Hash,
        )]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}
id_newtype!(InstitutionId);
id_newtype!(LessonId);
id_newtype!(GroupId);
id_newtype!(RoomId);
id_newtype!(TimeSlotId);
id_newtype!(StudentId);

/// Teachers are keyed by small integers, not UUIDs; they index directly
/// into capability maps.
#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq, Ord, PartialOrd, Hash,
)]
#[serde(transparent)]
pub struct TeacherId(pub i32);

impl fmt::Display for TeacherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    Class,
    Study,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct ClassGroup {
    pub id: GroupId,
    pub student_count: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct Room {
    pub id: RoomId,
    pub capacity: u32,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq, Hash)]
pub struct Capability {
    pub teacher: TeacherId,
    pub lesson: LessonId,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema)]
pub struct Demand {
    pub group: GroupId,
    pub lesson: LessonId,
    pub count: u32,
}

/// One row of the study-group membership relation.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema)]
pub struct StudyGroupMember {
    pub student: StudentId,
    #[serde(default)]
    pub class_group: Option<GroupId>,
    pub study_group: GroupId,
}

/// Aggregated memberships of one student, in first-seen row order.
/// Students with no study-group membership never appear here.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct StudentMembership {
    pub student: StudentId,
    #[serde(default)]
    pub class_group: Option<GroupId>,
    #[serde(default)]
    pub study_groups: Vec<GroupId>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    TeacherUnavailable,
    RoomUnavailable,
    ClassPreference,
    StudyGroupPreference,
    ConsecutivePreference,
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct CustomConstraint {
    pub kind: ConstraintKind,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default = "default_priority")]
    pub priority: i32,
}

fn default_priority() -> i32 {
    1
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct TeacherUnavailable {
    pub teacher_id: TeacherId,
    #[serde(default)]
    pub time_slot_ids: Vec<TimeSlotId>,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct RoomUnavailable {
    pub room_id: RoomId,
    #[serde(default)]
    pub time_slot_ids: Vec<TimeSlotId>,
}

/// Everything one generation request consumes, assembled once per request
/// and discarded on return. Ordered data stays in the vectors; the maps are
/// keyed lookup only.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct SchedulingInput {
    pub lessons: Vec<LessonId>,
    pub teachers: Vec<TeacherId>,
    pub class_groups: Vec<GroupId>,
    pub study_groups: Vec<GroupId>,
    pub rooms: Vec<RoomId>,
    pub time_slots: Vec<TimeSlotId>,
    #[serde(default)]
    pub teacher_lessons: HashMap<TeacherId, HashSet<LessonId>>,
    #[serde(default)]
    pub demand_class: HashMap<GroupId, HashMap<LessonId, u32>>,
    #[serde(default)]
    pub demand_study: HashMap<GroupId, HashMap<LessonId, u32>>,
    #[serde(default)]
    pub room_capacity: HashMap<RoomId, u32>,
    #[serde(default)]
    pub class_size: HashMap<GroupId, u32>,
    #[serde(default)]
    pub study_size: HashMap<GroupId, u32>,
    #[serde(default)]
    pub memberships: Vec<StudentMembership>,
    #[serde(default)]
    pub custom_constraints: Vec<CustomConstraint>,
}

impl SchedulingInput {
    pub fn demand_of(&self, kind: GroupKind, group: GroupId, lesson: LessonId) -> u32 {
        let map = match kind {
            GroupKind::Class => &self.demand_class,
            GroupKind::Study => &self.demand_study,
        };
        map.get(&group)
            .and_then(|per_lesson| per_lesson.get(&lesson))
            .copied()
            .unwrap_or(0)
    }

    pub fn size_of(&self, kind: GroupKind, group: GroupId) -> u32 {
        let map = match kind {
            GroupKind::Class => &self.class_size,
            GroupKind::Study => &self.study_size,
        };
        map.get(&group).copied().unwrap_or(0)
    }

    pub fn total_demand(&self) -> u64 {
        self.demand_class
            .values()
            .chain(self.demand_study.values())
            .flat_map(|per_lesson| per_lesson.values())
            .map(|&count| count as u64)
            .sum()
    }

    /// Class groups first, then study groups, each in input order.
    pub fn groups(&self) -> impl Iterator<Item = (GroupId, GroupKind)> + '_ {
        self.class_groups
            .iter()
            .map(|&g| (g, GroupKind::Class))
            .chain(self.study_groups.iter().map(|&g| (g, GroupKind::Study)))
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq, Hash)]
pub struct ScheduleEntry {
    pub lesson_id: LessonId,
    pub teacher_id: TeacherId,
    pub room_id: RoomId,
    pub time_slot_id: TimeSlotId,
    #[serde(default)]
    pub class_group_id: Option<GroupId>,
    #[serde(default)]
    pub study_group_id: Option<GroupId>,
}

impl ScheduleEntry {
    pub fn group_id(&self) -> Option<GroupId> {
        self.class_group_id.or(self.study_group_id)
    }
}
