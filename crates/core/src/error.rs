use std::fmt;
use thiserror::Error;
use types::{GroupId, LessonId};

/// Structural problems the validator reports before any encoding happens.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("No lessons found for this institution")]
    NoLessons,
    #[error("No teachers found for this institution")]
    NoTeachers,
    #[error("No class groups or study groups found for this institution")]
    NoGroups,
    #[error("No rooms found for this institution")]
    NoRooms,
    #[error("No time slots found for this institution")]
    NoTimeSlots,
    #[error("No teachers have assigned lessons")]
    NoTeachersWithLessons,
    #[error("No lesson-group assignments; assign lessons to class groups and/or study groups")]
    NoDemand,
    #[error("No lesson-group assignment has a teacher able to teach it; assign those lessons to at least one teacher")]
    NoTeachableDemand,
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum InfeasibleReason {
    #[error("no assigned teacher can teach this lesson for this group")]
    NoTeacher,
    #[error("need {need} placements but only {have} valid (teacher, room, slot) combinations")]
    NotEnoughPlacements { need: u32, have: usize },
    #[error("no room has sufficient capacity")]
    NoRoomFits,
}

/// One demand pair that can never be placed, found before solving.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InfeasiblePair {
    pub lesson: LessonId,
    pub group: GroupId,
    pub reason: InfeasibleReason,
}

impl fmt::Display for InfeasiblePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lesson {} group {}: {}", self.lesson, self.group, self.reason)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoSolutionKind {
    ResourceConflict,
    CapacityOrAvailability,
    Timeout,
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("invalid input: {reason}")]
    InvalidInput { reason: InputError },
    #[error("infeasible: {}", join_pairs(.pairs))]
    Infeasible { pairs: Vec<InfeasiblePair> },
    #[error("no solution: {message}")]
    NoSolution {
        kind: NoSolutionKind,
        message: String,
    },
    #[error("storage error: {0}")]
    Store(#[source] anyhow::Error),
    #[error("solver error: {0}")]
    Solver(#[source] anyhow::Error),
}

impl GenerateError {
    pub fn resource_conflict() -> Self {
        GenerateError::NoSolution {
            kind: NoSolutionKind::ResourceConflict,
            message: "resource conflicts make the schedule impossible (teacher, room, or \
                      student overlap in at least one time slot); try more time slots, \
                      more teachers, or more rooms"
                .into(),
        }
    }

    pub fn capacity_or_availability() -> Self {
        GenerateError::NoSolution {
            kind: NoSolutionKind::CapacityOrAvailability,
            message: "some (lesson, group) pairs have no valid (teacher, room, time slot) \
                      after room capacity and teacher/room unavailability; check room \
                      capacity and teacher/room availability constraints"
                .into(),
        }
    }

    pub fn timeout(secs: u64) -> Self {
        GenerateError::NoSolution {
            kind: NoSolutionKind::Timeout,
            message: format!("solver timed out after {secs} seconds"),
        }
    }
}

fn join_pairs(pairs: &[InfeasiblePair]) -> String {
    pairs
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
