use std::collections::{HashMap, HashSet};
use tracing::info;

use crate::ScheduleStore;
use types::{
    GroupId, InstitutionId, LessonId, RoomId, SchedulingInput, StudentId, StudentMembership,
    TeacherId,
};

/// Loads every collection for one institution and folds it into an immutable
/// [`SchedulingInput`]. One bulk fetch per collection, no per-entity queries.
pub async fn build<S>(store: &S, institution: InstitutionId) -> anyhow::Result<SchedulingInput>
where
    S: ScheduleStore + ?Sized,
{
    let lessons = store.lessons(institution).await?;
    let teachers = store.teachers(institution).await?;
    let class_group_rows = store.class_groups(institution).await?;
    let study_groups = store.study_groups(institution).await?;
    let room_rows = store.rooms(institution).await?;
    let time_slots = store.time_slots(institution).await?;
    let capability_rows = store.teacher_lessons(institution).await?;
    let class_demand_rows = store.class_group_demand(institution).await?;
    let study_demand_rows = store.study_group_demand(institution).await?;
    let member_rows = store.study_group_members(institution).await?;
    let custom_constraints = store.constraints(institution).await?;

    // Every teacher gets a capability set, empty ones included; links to
    // teachers outside this institution are dropped.
    let mut teacher_lessons: HashMap<TeacherId, HashSet<LessonId>> =
        teachers.iter().map(|&t| (t, HashSet::new())).collect();
    for link in &capability_rows {
        if let Some(set) = teacher_lessons.get_mut(&link.teacher) {
            set.insert(link.lesson);
        }
    }

    let mut demand_class: HashMap<GroupId, HashMap<LessonId, u32>> = HashMap::new();
    for d in &class_demand_rows {
        demand_class
            .entry(d.group)
            .or_default()
            .insert(d.lesson, d.count);
    }
    let mut demand_study: HashMap<GroupId, HashMap<LessonId, u32>> = HashMap::new();
    for d in &study_demand_rows {
        demand_study
            .entry(d.group)
            .or_default()
            .insert(d.lesson, d.count);
    }

    let rooms: Vec<RoomId> = room_rows.iter().map(|r| r.id).collect();
    let room_capacity: HashMap<RoomId, u32> =
        room_rows.iter().map(|r| (r.id, r.capacity)).collect();

    let class_groups: Vec<GroupId> = class_group_rows.iter().map(|g| g.id).collect();
    let class_size: HashMap<GroupId, u32> = class_group_rows
        .iter()
        .map(|g| (g.id, g.student_count))
        .collect();

    // Study-group sizes are derived from membership, never user-provided.
    let mut study_size: HashMap<GroupId, u32> =
        study_groups.iter().map(|&g| (g, 0)).collect();
    let mut memberships: Vec<StudentMembership> = Vec::new();
    let mut by_student: HashMap<StudentId, usize> = HashMap::new();
    for row in &member_rows {
        if !study_size.contains_key(&row.study_group) {
            continue;
        }
        let idx = *by_student.entry(row.student).or_insert_with(|| {
            memberships.push(StudentMembership {
                student: row.student,
                class_group: row.class_group,
                study_groups: Vec::new(),
            });
            memberships.len() - 1
        });
        let membership = &mut memberships[idx];
        if membership.class_group.is_none() {
            membership.class_group = row.class_group;
        }
        // duplicate rows do not inflate the derived size
        if !membership.study_groups.contains(&row.study_group) {
            membership.study_groups.push(row.study_group);
            if let Some(size) = study_size.get_mut(&row.study_group) {
                *size += 1;
            }
        }
    }

    info!(
        lessons = lessons.len(),
        teachers = teachers.len(),
        class_groups = class_groups.len(),
        study_groups = study_groups.len(),
        rooms = rooms.len(),
        time_slots = time_slots.len(),
        constraints = custom_constraints.len(),
        "assembled scheduling input"
    );

    Ok(SchedulingInput {
        lessons,
        teachers,
        class_groups,
        study_groups,
        rooms,
        time_slots,
        teacher_lessons,
        demand_class,
        demand_study,
        room_capacity,
        class_size,
        study_size,
        memberships,
        custom_constraints,
    })
}
