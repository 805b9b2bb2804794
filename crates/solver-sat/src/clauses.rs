use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::warn;

use crate::card;
use crate::encode::VarTable;
use types::{
    ConstraintKind, GroupId, RoomId, RoomUnavailable, SchedulingInput, TeacherId,
    TeacherUnavailable, TimeSlotId,
};

/// Receives clauses as they are produced; the solver implements this so the
/// CNF is never materialized. The `Vec` impl exists for tests.
pub trait ClauseSink {
    fn add(&mut self, lits: &[i32]) -> anyhow::Result<()>;
}

impl ClauseSink for Vec<Vec<i32>> {
    fn add(&mut self, lits: &[i32]) -> anyhow::Result<()> {
        self.push(lits.to_vec());
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmitMode {
    Full,
    /// Demand, capacity pruning and custom constraints only. The diagnoser
    /// uses this to tell resource contention apart from capacity and
    /// unavailability obstructions.
    SkipConflicts,
}

/// Streams the whole constraint system into `sink`. Emission order is a pure
/// function of the input orderings: demand cardinality, then (full mode)
/// teacher, group, student-overlap and room exclusivity, then capacity
/// pruning, then custom constraints.
pub fn emit(
    input: &SchedulingInput,
    table: &mut VarTable,
    mode: EmitMode,
    sink: &mut dyn ClauseSink,
) -> anyhow::Result<()> {
    emit_demand(input, table, sink)?;
    if mode == EmitMode::Full {
        emit_teacher_exclusivity(input, table, sink)?;
        emit_group_exclusivity(input, table, sink)?;
        emit_student_overlap(input, table, sink)?;
        emit_room_exclusivity(input, table, sink)?;
    }
    emit_capacity_pruning(input, table, sink)?;
    emit_custom(input, table, sink)?;
    Ok(())
}

fn emit_demand(
    input: &SchedulingInput,
    table: &mut VarTable,
    sink: &mut dyn ClauseSink,
) -> anyhow::Result<()> {
    for (group, kind) in input.groups() {
        for &lesson in &input.lessons {
            let need = input.demand_of(kind, group, lesson);
            if need == 0 {
                continue;
            }
            let vars = table.pair_vars(lesson, group).to_vec();
            if vars.len() < need as usize {
                // the probe has already reported this pair
                continue;
            }
            let top = card::exactly_k(&vars, need, table.next_var(), sink)?;
            table.advance_to(top);
        }
    }
    Ok(())
}

fn amo(vars: &[i32], sink: &mut dyn ClauseSink) -> anyhow::Result<()> {
    for (i, &a) in vars.iter().enumerate() {
        for &b in &vars[i + 1..] {
            sink.add(&[-a, -b])?;
        }
    }
    Ok(())
}

fn cross_amo(left: &[i32], right: &[i32], sink: &mut dyn ClauseSink) -> anyhow::Result<()> {
    for &a in left {
        for &b in right {
            sink.add(&[-a, -b])?;
        }
    }
    Ok(())
}

fn emit_teacher_exclusivity(
    input: &SchedulingInput,
    table: &VarTable,
    sink: &mut dyn ClauseSink,
) -> anyhow::Result<()> {
    let teacher_pos: HashMap<TeacherId, usize> = input
        .teachers
        .iter()
        .enumerate()
        .map(|(i, &t)| (t, i))
        .collect();
    let slot_pos = slot_positions(input);
    let mut by_key: BTreeMap<(usize, usize), Vec<i32>> = BTreeMap::new();
    for (var, p) in table.placements() {
        let (Some(&ti), Some(&si)) = (teacher_pos.get(&p.teacher), slot_pos.get(&p.slot)) else {
            continue;
        };
        by_key.entry((ti, si)).or_default().push(var);
    }
    for vars in by_key.values() {
        amo(vars, sink)?;
    }
    Ok(())
}

fn emit_group_exclusivity(
    input: &SchedulingInput,
    table: &VarTable,
    sink: &mut dyn ClauseSink,
) -> anyhow::Result<()> {
    let group_pos: HashMap<GroupId, usize> = input
        .groups()
        .enumerate()
        .map(|(i, (g, _))| (g, i))
        .collect();
    let slot_pos = slot_positions(input);
    let mut by_key: BTreeMap<(usize, usize), Vec<i32>> = BTreeMap::new();
    for (var, p) in table.placements() {
        let (Some(&gi), Some(&si)) = (group_pos.get(&p.group), slot_pos.get(&p.slot)) else {
            continue;
        };
        by_key.entry((gi, si)).or_default().push(var);
    }
    for vars in by_key.values() {
        amo(vars, sink)?;
    }
    Ok(())
}

fn emit_room_exclusivity(
    input: &SchedulingInput,
    table: &VarTable,
    sink: &mut dyn ClauseSink,
) -> anyhow::Result<()> {
    let room_pos: HashMap<RoomId, usize> = input
        .rooms
        .iter()
        .enumerate()
        .map(|(i, &r)| (r, i))
        .collect();
    let slot_pos = slot_positions(input);
    let mut by_key: BTreeMap<(usize, usize), Vec<i32>> = BTreeMap::new();
    for (var, p) in table.placements() {
        let (Some(&ri), Some(&si)) = (room_pos.get(&p.room), slot_pos.get(&p.slot)) else {
            continue;
        };
        by_key.entry((ri, si)).or_default().push(var);
    }
    for vars in by_key.values() {
        amo(vars, sink)?;
    }
    Ok(())
}

/// A student in a class group and a study group (or in two study groups)
/// cannot sit in two places at once: cross-AMO between the groups' variables
/// per slot. Pairs are deduplicated and ordered by input position, so one
/// shared student emits the same clauses as ten.
fn emit_student_overlap(
    input: &SchedulingInput,
    table: &VarTable,
    sink: &mut dyn ClauseSink,
) -> anyhow::Result<()> {
    let class_pos: HashMap<GroupId, usize> = input
        .class_groups
        .iter()
        .enumerate()
        .map(|(i, &g)| (g, i))
        .collect();
    let study_pos: HashMap<GroupId, usize> = input
        .study_groups
        .iter()
        .enumerate()
        .map(|(i, &g)| (g, i))
        .collect();

    let mut class_study: BTreeSet<(usize, usize)> = BTreeSet::new();
    let mut study_study: BTreeSet<(usize, usize)> = BTreeSet::new();
    for membership in &input.memberships {
        let study_idxs: Vec<usize> = membership
            .study_groups
            .iter()
            .filter_map(|g| study_pos.get(g).copied())
            .collect();
        if let Some(ci) = membership
            .class_group
            .and_then(|g| class_pos.get(&g).copied())
        {
            for &si in &study_idxs {
                class_study.insert((ci, si));
            }
        }
        for (n, &a) in study_idxs.iter().enumerate() {
            for &b in &study_idxs[n + 1..] {
                if a != b {
                    study_study.insert((a.min(b), a.max(b)));
                }
            }
        }
    }
    if class_study.is_empty() && study_study.is_empty() {
        return Ok(());
    }

    let mut group_slot: HashMap<(GroupId, TimeSlotId), Vec<i32>> = HashMap::new();
    for (var, p) in table.placements() {
        group_slot.entry((p.group, p.slot)).or_default().push(var);
    }
    let empty: Vec<i32> = Vec::new();
    let vars_at =
        |group: GroupId, slot: TimeSlotId| group_slot.get(&(group, slot)).unwrap_or(&empty);

    for &(ci, si) in &class_study {
        let class_group = input.class_groups[ci];
        let study_group = input.study_groups[si];
        for &slot in &input.time_slots {
            cross_amo(vars_at(class_group, slot), vars_at(study_group, slot), sink)?;
        }
    }
    for &(ai, bi) in &study_study {
        let first = input.study_groups[ai];
        let second = input.study_groups[bi];
        for &slot in &input.time_slots {
            cross_amo(vars_at(first, slot), vars_at(second, slot), sink)?;
        }
    }
    Ok(())
}

fn emit_capacity_pruning(
    input: &SchedulingInput,
    table: &VarTable,
    sink: &mut dyn ClauseSink,
) -> anyhow::Result<()> {
    for (var, p) in table.placements() {
        let Some(kind) = table.kind_of(p.group) else {
            continue;
        };
        let size = input.size_of(kind, p.group);
        let capacity = input.room_capacity.get(&p.room).copied().unwrap_or(0);
        if size > capacity {
            sink.add(&[-var])?;
        }
    }
    Ok(())
}

fn emit_custom(
    input: &SchedulingInput,
    table: &VarTable,
    sink: &mut dyn ClauseSink,
) -> anyhow::Result<()> {
    for constraint in &input.custom_constraints {
        match constraint.kind {
            ConstraintKind::TeacherUnavailable => {
                let payload: TeacherUnavailable =
                    match serde_json::from_value(constraint.payload.clone()) {
                        Ok(payload) => payload,
                        Err(err) => {
                            warn!(%err, "skipping teacher_unavailable constraint with bad payload");
                            continue;
                        }
                    };
                for &slot in &payload.time_slot_ids {
                    for (var, p) in table.placements() {
                        if p.teacher == payload.teacher_id && p.slot == slot {
                            sink.add(&[-var])?;
                        }
                    }
                }
            }
            ConstraintKind::RoomUnavailable => {
                let payload: RoomUnavailable =
                    match serde_json::from_value(constraint.payload.clone()) {
                        Ok(payload) => payload,
                        Err(err) => {
                            warn!(%err, "skipping room_unavailable constraint with bad payload");
                            continue;
                        }
                    };
                for &slot in &payload.time_slot_ids {
                    for (var, p) in table.placements() {
                        if p.room == payload.room_id && p.slot == slot {
                            sink.add(&[-var])?;
                        }
                    }
                }
            }
            // preference kinds and unknown kinds are accepted but emit nothing
            ConstraintKind::ClassPreference
            | ConstraintKind::StudyGroupPreference
            | ConstraintKind::ConsecutivePreference
            | ConstraintKind::Unknown => {}
        }
    }
    Ok(())
}

fn slot_positions(input: &SchedulingInput) -> HashMap<TimeSlotId, usize> {
    input
        .time_slots
        .iter()
        .enumerate()
        .map(|(i, &s)| (s, i))
        .collect()
}
