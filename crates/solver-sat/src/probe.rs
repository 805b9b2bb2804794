use crate::encode::VarTable;
use sched_core::{InfeasiblePair, InfeasibleReason};
use types::SchedulingInput;

/// Static per-pair feasibility check, run after encoding and before any
/// clause is emitted. A demand pair with no placement at all, fewer
/// placements than its count, or no room that seats the group can never be
/// satisfied, and solving would only produce an unexplained UNSAT.
pub(crate) fn infeasible_pairs(input: &SchedulingInput, table: &VarTable) -> Vec<InfeasiblePair> {
    let mut pairs = Vec::new();
    for (group, kind) in input.groups() {
        for &lesson in &input.lessons {
            let need = input.demand_of(kind, group, lesson);
            if need == 0 {
                continue;
            }
            let vars = table.pair_vars(lesson, group);
            let reason = if vars.is_empty() {
                Some(InfeasibleReason::NoTeacher)
            } else if vars.len() < need as usize {
                Some(InfeasibleReason::NotEnoughPlacements {
                    need,
                    have: vars.len(),
                })
            } else {
                let size = input.size_of(kind, group);
                let fits = vars.iter().any(|&v| {
                    table.tuple_of(v).map_or(false, |p| {
                        input.room_capacity.get(&p.room).copied().unwrap_or(0) >= size
                    })
                });
                if fits {
                    None
                } else {
                    Some(InfeasibleReason::NoRoomFits)
                }
            };
            if let Some(reason) = reason {
                pairs.push(InfeasiblePair {
                    lesson,
                    group,
                    reason,
                });
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use types::{GroupId, LessonId, RoomId, TeacherId, TimeSlotId};
    use uuid::Uuid;

    fn base_input() -> SchedulingInput {
        let lesson = LessonId(Uuid::new_v4());
        let cg = GroupId(Uuid::new_v4());
        let room = RoomId(Uuid::new_v4());
        let mut input = SchedulingInput {
            lessons: vec![lesson],
            teachers: vec![TeacherId(1)],
            class_groups: vec![cg],
            rooms: vec![room],
            time_slots: vec![TimeSlotId(Uuid::new_v4())],
            ..Default::default()
        };
        input
            .teacher_lessons
            .insert(TeacherId(1), HashSet::from([lesson]));
        input.demand_class.insert(cg, HashMap::from([(lesson, 1)]));
        input.class_size.insert(cg, 10);
        input.room_capacity.insert(room, 30);
        input
    }

    #[test]
    fn feasible_pair_passes() {
        let input = base_input();
        let table = VarTable::encode(&input);
        assert!(infeasible_pairs(&input, &table).is_empty());
    }

    #[test]
    fn reports_missing_teacher() {
        let mut input = base_input();
        for set in input.teacher_lessons.values_mut() {
            set.clear();
        }
        let table = VarTable::encode(&input);
        let pairs = infeasible_pairs(&input, &table);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].reason, InfeasibleReason::NoTeacher);
        assert_eq!(pairs[0].lesson, input.lessons[0]);
        assert_eq!(pairs[0].group, input.class_groups[0]);
    }

    #[test]
    fn reports_short_placement_supply() {
        let mut input = base_input();
        let cg = input.class_groups[0];
        let lesson = input.lessons[0];
        input.demand_class.insert(cg, HashMap::from([(lesson, 3)]));
        // one teacher x one room x one slot = a single placement
        let table = VarTable::encode(&input);
        let pairs = infeasible_pairs(&input, &table);
        assert_eq!(pairs.len(), 1);
        assert_eq!(
            pairs[0].reason,
            InfeasibleReason::NotEnoughPlacements { need: 3, have: 1 }
        );
    }

    #[test]
    fn reports_no_room_large_enough() {
        let mut input = base_input();
        let cg = input.class_groups[0];
        input.class_size.insert(cg, 50);
        input.room_capacity.insert(input.rooms[0], 20);
        let table = VarTable::encode(&input);
        let pairs = infeasible_pairs(&input, &table);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].reason, InfeasibleReason::NoRoomFits);
    }
}
