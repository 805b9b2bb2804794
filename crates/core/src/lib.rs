pub mod assemble;
mod error;

use async_trait::async_trait;
use serde::Deserialize;

pub use error::{GenerateError, InfeasiblePair, InfeasibleReason, InputError, NoSolutionKind};
pub use types::{
    Capability, ClassGroup, CustomConstraint, Demand, GroupId, GroupKind, InstitutionId,
    LessonId, Room, RoomId, ScheduleEntry, SchedulingInput, StudentId, StudyGroupMember,
    TeacherId, TimeSlotId,
};

const DEFAULT_SOLVE_TIMEOUT_SECS: u64 = 300;

/// Knobs the host injects into a generation request. There is no process-wide
/// configuration anywhere in the core.
#[derive(Clone, Debug, Deserialize)]
pub struct Settings {
    #[serde(default = "default_solve_timeout")]
    pub solve_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            solve_timeout_secs: DEFAULT_SOLVE_TIMEOUT_SECS,
        }
    }
}

fn default_solve_timeout() -> u64 {
    DEFAULT_SOLVE_TIMEOUT_SECS
}

/// Persistence collaborator. Each method is one institution-scoped bulk
/// fetch; the assembler calls every method exactly once per request.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn lessons(&self, institution: InstitutionId) -> anyhow::Result<Vec<LessonId>>;
    async fn teachers(&self, institution: InstitutionId) -> anyhow::Result<Vec<TeacherId>>;
    async fn class_groups(&self, institution: InstitutionId) -> anyhow::Result<Vec<ClassGroup>>;
    async fn study_groups(&self, institution: InstitutionId) -> anyhow::Result<Vec<GroupId>>;
    async fn rooms(&self, institution: InstitutionId) -> anyhow::Result<Vec<Room>>;
    async fn time_slots(&self, institution: InstitutionId) -> anyhow::Result<Vec<TimeSlotId>>;
    async fn teacher_lessons(&self, institution: InstitutionId) -> anyhow::Result<Vec<Capability>>;
    async fn class_group_demand(&self, institution: InstitutionId) -> anyhow::Result<Vec<Demand>>;
    async fn study_group_demand(&self, institution: InstitutionId) -> anyhow::Result<Vec<Demand>>;
    async fn study_group_members(
        &self,
        institution: InstitutionId,
    ) -> anyhow::Result<Vec<StudyGroupMember>>;
    async fn constraints(
        &self,
        institution: InstitutionId,
    ) -> anyhow::Result<Vec<CustomConstraint>>;
}

/// Structural checks that make solving pointless when they fail. Deliberately
/// does not compare `|time_slots|` against total demand: groups may share a
/// slot whenever no resource conflicts arise.
pub fn validate(input: &SchedulingInput) -> Result<(), InputError> {
    if input.lessons.is_empty() {
        return Err(InputError::NoLessons);
    }
    if input.teachers.is_empty() {
        return Err(InputError::NoTeachers);
    }
    if input.class_groups.is_empty() && input.study_groups.is_empty() {
        return Err(InputError::NoGroups);
    }
    if input.rooms.is_empty() {
        return Err(InputError::NoRooms);
    }
    if input.time_slots.is_empty() {
        return Err(InputError::NoTimeSlots);
    }
    if input.teacher_lessons.values().all(|set| set.is_empty()) {
        return Err(InputError::NoTeachersWithLessons);
    }
    if input.total_demand() == 0 {
        return Err(InputError::NoDemand);
    }

    let teachable = |lesson: &LessonId| {
        input
            .teacher_lessons
            .values()
            .any(|set| set.contains(lesson))
    };
    let any_teachable = input
        .demand_class
        .values()
        .chain(input.demand_study.values())
        .flat_map(|per_lesson| per_lesson.iter())
        .any(|(lesson, &count)| count > 0 && teachable(lesson));
    if !any_teachable {
        return Err(InputError::NoTeachableDemand);
    }

    Ok(())
}
