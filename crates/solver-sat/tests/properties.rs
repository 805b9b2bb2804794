use std::collections::HashSet;
use std::time::Duration;

use proptest::prelude::*;
use solver_sat::{emit, generate_schedule, EmitMode, VarTable};
use types::{GroupId, GroupKind, LessonId, RoomId, SchedulingInput, TeacherId, TimeSlotId};
use uuid::Uuid;

fn uuid_of(tag: u64, n: usize) -> Uuid {
    Uuid::from_u128(((tag as u128) << 64) | (n as u128 + 1))
}

#[allow(clippy::too_many_arguments)]
fn build_input(
    nl: usize,
    nt: usize,
    ncg: usize,
    nsg: usize,
    nr: usize,
    ns: usize,
    cap_bits: Vec<bool>,
    demand_counts: Vec<u32>,
    class_sizes: Vec<u32>,
    study_sizes: Vec<u32>,
    capacities: Vec<u32>,
) -> SchedulingInput {
    let lessons: Vec<LessonId> = (0..nl).map(|i| LessonId(uuid_of(1, i))).collect();
    let teachers: Vec<TeacherId> = (0..nt).map(|i| TeacherId(i as i32 + 1)).collect();
    let class_groups: Vec<GroupId> = (0..ncg).map(|i| GroupId(uuid_of(2, i))).collect();
    let study_groups: Vec<GroupId> = (0..nsg).map(|i| GroupId(uuid_of(3, i))).collect();
    let rooms: Vec<RoomId> = (0..nr).map(|i| RoomId(uuid_of(4, i))).collect();
    let time_slots: Vec<TimeSlotId> = (0..ns).map(|i| TimeSlotId(uuid_of(5, i))).collect();

    let mut input = SchedulingInput {
        lessons: lessons.clone(),
        teachers: teachers.clone(),
        class_groups: class_groups.clone(),
        study_groups: study_groups.clone(),
        rooms: rooms.clone(),
        time_slots,
        ..Default::default()
    };
    for (ti, &teacher) in teachers.iter().enumerate() {
        let set: HashSet<LessonId> = lessons
            .iter()
            .enumerate()
            .filter(|&(li, _)| cap_bits[ti * nl + li])
            .map(|(_, &l)| l)
            .collect();
        input.teacher_lessons.insert(teacher, set);
    }
    let mut next_demand = demand_counts.into_iter();
    for &g in &class_groups {
        for &l in &lessons {
            let count = next_demand.next().unwrap_or(0);
            if count > 0 {
                input.demand_class.entry(g).or_default().insert(l, count);
            }
        }
    }
    for &g in &study_groups {
        for &l in &lessons {
            let count = next_demand.next().unwrap_or(0);
            if count > 0 {
                input.demand_study.entry(g).or_default().insert(l, count);
            }
        }
    }
    for (i, &g) in class_groups.iter().enumerate() {
        input.class_size.insert(g, class_sizes[i]);
    }
    for (i, &g) in study_groups.iter().enumerate() {
        input.study_size.insert(g, study_sizes[i]);
    }
    for (i, &r) in rooms.iter().enumerate() {
        input.room_capacity.insert(r, capacities[i]);
    }
    input
}

prop_compose! {
    fn instance()
        (
            nl in 1usize..=2,
            nt in 1usize..=2,
            ncg in 0usize..=2,
            nsg in 0usize..=2,
            nr in 1usize..=2,
            ns in 1usize..=3,
        )
        (
            cap_bits in proptest::collection::vec(any::<bool>(), nl * nt),
            demand_counts in proptest::collection::vec(0u32..=2, nl * (ncg + nsg)),
            class_sizes in proptest::collection::vec(1u32..=30, ncg),
            study_sizes in proptest::collection::vec(1u32..=30, nsg),
            capacities in proptest::collection::vec(10u32..=40, nr),
            nl in Just(nl),
            nt in Just(nt),
            ncg in Just(ncg),
            nsg in Just(nsg),
            nr in Just(nr),
            ns in Just(ns),
        )
        -> SchedulingInput
    {
        build_input(
            nl, nt, ncg, nsg, nr, ns,
            cap_bits, demand_counts, class_sizes, study_sizes, capacities,
        )
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// A successful run satisfies every universal invariant: demand counts
    /// are met exactly, teachers only teach what they can, rooms fit their
    /// groups, and no resource is double-booked in a slot.
    #[test]
    fn solved_schedules_respect_invariants(input in instance()) {
        let Ok(entries) = generate_schedule(&input, Duration::from_secs(20)) else {
            // infeasible or unsatisfiable instances are legitimate outcomes
            return Ok(());
        };

        for (g, kind) in input.groups() {
            for &l in &input.lessons {
                let need = input.demand_of(kind, g, l) as usize;
                let have = entries
                    .iter()
                    .filter(|e| e.group_id() == Some(g) && e.lesson_id == l)
                    .count();
                prop_assert_eq!(have, need, "demand not met for group {} lesson {}", g, l);
            }
        }

        let mut teachers = HashSet::new();
        let mut rooms = HashSet::new();
        let mut groups = HashSet::new();
        for e in &entries {
            prop_assert!(e.class_group_id.is_some() ^ e.study_group_id.is_some());
            prop_assert!(input.teacher_lessons[&e.teacher_id].contains(&e.lesson_id));

            let kind = if e.class_group_id.is_some() {
                GroupKind::Class
            } else {
                GroupKind::Study
            };
            let group = e.group_id().unwrap();
            prop_assert!(input.room_capacity[&e.room_id] >= input.size_of(kind, group));

            prop_assert!(teachers.insert((e.time_slot_id, e.teacher_id)));
            prop_assert!(rooms.insert((e.time_slot_id, e.room_id)));
            prop_assert!(groups.insert((e.time_slot_id, group)));
        }
    }

    /// Encoding and clause emission are deterministic functions of the input
    /// orderings: same input, same variable count, same clause sequence.
    #[test]
    fn encoding_is_deterministic(input in instance()) {
        let mut first_table = VarTable::encode(&input);
        let mut first: Vec<Vec<i32>> = Vec::new();
        emit(&input, &mut first_table, EmitMode::Full, &mut first).unwrap();

        let mut second_table = VarTable::encode(&input);
        let mut second: Vec<Vec<i32>> = Vec::new();
        emit(&input, &mut second_table, EmitMode::Full, &mut second).unwrap();

        prop_assert_eq!(first_table.var_count(), second_table.var_count());
        prop_assert_eq!(first_table.next_var(), second_table.next_var());
        prop_assert_eq!(first, second);
    }
}
