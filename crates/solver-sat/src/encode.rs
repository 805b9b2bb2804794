use std::collections::hash_map::Entry;
use std::collections::HashMap;

use types::{GroupId, GroupKind, LessonId, RoomId, SchedulingInput, TeacherId, TimeSlotId};

/// One feasible (lesson, teacher, group, room, slot) placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Placement {
    pub lesson: LessonId,
    pub teacher: TeacherId,
    pub group: GroupId,
    pub room: RoomId,
    pub slot: TimeSlotId,
}

/// Two-way index between placements and solver variables. Variables start at
/// 1 and `next_var` only grows; cardinality auxiliaries are allocated past
/// the placement range and never reused.
pub struct VarTable {
    var_of: HashMap<Placement, i32>,
    tuple_of: Vec<Placement>,
    pair_vars: HashMap<(LessonId, GroupId), Vec<i32>>,
    group_kind: HashMap<GroupId, GroupKind>,
    next_var: i32,
}

impl VarTable {
    /// Allocates a variable for every placement where the teacher can teach
    /// the lesson and the group demands it. Rooms and slots are enumerated
    /// unfiltered; capacity and unavailability become unit clauses later.
    /// Allocation order is a pure function of the input orderings.
    pub fn encode(input: &SchedulingInput) -> Self {
        let mut table = VarTable {
            var_of: HashMap::new(),
            tuple_of: Vec::new(),
            pair_vars: HashMap::new(),
            group_kind: HashMap::new(),
            next_var: 1,
        };
        for (group, kind) in input.groups() {
            table.group_kind.insert(group, kind);
        }
        for &lesson in &input.lessons {
            for &teacher in &input.teachers {
                let capable = input
                    .teacher_lessons
                    .get(&teacher)
                    .map_or(false, |set| set.contains(&lesson));
                if !capable {
                    continue;
                }
                for (group, kind) in input.groups() {
                    if input.demand_of(kind, group, lesson) == 0 {
                        continue;
                    }
                    for &room in &input.rooms {
                        for &slot in &input.time_slots {
                            table.alloc(Placement {
                                lesson,
                                teacher,
                                group,
                                room,
                                slot,
                            });
                        }
                    }
                }
            }
        }
        table
    }

    fn alloc(&mut self, placement: Placement) {
        if let Entry::Vacant(entry) = self.var_of.entry(placement) {
            let var = self.next_var;
            entry.insert(var);
            self.tuple_of.push(placement);
            self.pair_vars
                .entry((placement.lesson, placement.group))
                .or_default()
                .push(var);
            self.next_var += 1;
        }
    }

    pub fn var_count(&self) -> usize {
        self.tuple_of.len()
    }

    pub fn next_var(&self) -> i32 {
        self.next_var
    }

    /// Gadget hygiene: bump `next_var` past auxiliaries; never rewinds.
    pub fn advance_to(&mut self, var: i32) {
        self.next_var = self.next_var.max(var);
    }

    pub fn var_of(&self, placement: &Placement) -> Option<i32> {
        self.var_of.get(placement).copied()
    }

    /// The placement behind a variable, or `None` for auxiliaries.
    pub fn tuple_of(&self, var: i32) -> Option<&Placement> {
        if var < 1 {
            return None;
        }
        self.tuple_of.get((var - 1) as usize)
    }

    pub fn pair_vars(&self, lesson: LessonId, group: GroupId) -> &[i32] {
        self.pair_vars
            .get(&(lesson, group))
            .map_or(&[], Vec::as_slice)
    }

    pub fn kind_of(&self, group: GroupId) -> Option<GroupKind> {
        self.group_kind.get(&group).copied()
    }

    /// All placement variables in allocation order.
    pub fn placements(&self) -> impl Iterator<Item = (i32, &Placement)> {
        self.tuple_of
            .iter()
            .enumerate()
            .map(|(i, p)| ((i + 1) as i32, p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use uuid::Uuid;

    fn two_pair_input() -> SchedulingInput {
        let l1 = LessonId(Uuid::new_v4());
        let l2 = LessonId(Uuid::new_v4());
        let cg = GroupId(Uuid::new_v4());
        let sg = GroupId(Uuid::new_v4());
        let mut input = SchedulingInput {
            lessons: vec![l1, l2],
            teachers: vec![TeacherId(1), TeacherId(2)],
            class_groups: vec![cg],
            study_groups: vec![sg],
            rooms: vec![RoomId(Uuid::new_v4()), RoomId(Uuid::new_v4())],
            time_slots: vec![TimeSlotId(Uuid::new_v4()), TimeSlotId(Uuid::new_v4())],
            ..Default::default()
        };
        input
            .teacher_lessons
            .insert(TeacherId(1), HashSet::from([l1]));
        input
            .teacher_lessons
            .insert(TeacherId(2), HashSet::from([l2]));
        input.demand_class.insert(cg, HashMap::from([(l1, 1)]));
        input.demand_study.insert(sg, HashMap::from([(l2, 2)]));
        input
    }

    #[test]
    fn allocates_only_capable_demanded_tuples() {
        let input = two_pair_input();
        let table = VarTable::encode(&input);
        // each demanded pair has exactly one capable teacher; rooms x slots = 4
        assert_eq!(table.var_count(), 8);
        assert_eq!(table.next_var(), 9);
        for (_, p) in table.placements() {
            assert!(input.teacher_lessons[&p.teacher].contains(&p.lesson));
            let kind = table.kind_of(p.group).unwrap();
            assert!(input.demand_of(kind, p.group, p.lesson) > 0);
        }
        assert_eq!(
            table.pair_vars(input.lessons[0], input.class_groups[0]).len(),
            4
        );
        assert_eq!(
            table.pair_vars(input.lessons[1], input.study_groups[0]).len(),
            4
        );
        assert!(table
            .pair_vars(input.lessons[0], input.study_groups[0])
            .is_empty());
    }

    #[test]
    fn round_trips_variables() {
        let input = two_pair_input();
        let table = VarTable::encode(&input);
        for (var, p) in table.placements() {
            assert_eq!(table.var_of(p), Some(var));
            assert_eq!(table.tuple_of(var), Some(p));
        }
        assert!(table.tuple_of(0).is_none());
        assert!(table.tuple_of(table.next_var()).is_none());
    }

    #[test]
    fn kinds_cover_all_groups() {
        let input = two_pair_input();
        let table = VarTable::encode(&input);
        assert_eq!(table.kind_of(input.class_groups[0]), Some(GroupKind::Class));
        assert_eq!(table.kind_of(input.study_groups[0]), Some(GroupKind::Study));
        assert_eq!(table.kind_of(GroupId(Uuid::new_v4())), None);
    }
}
