//! SAT-based timetable generation: encodes institution data as CNF, runs a
//! Glucose CDCL core, and decodes the model into schedule entries.

mod card;
mod clauses;
mod encode;
mod probe;
mod sat;

use std::time::Duration;

use tracing::info;

use sched_core::{assemble, validate, GenerateError, InstitutionId, ScheduleStore, Settings};
use types::{GroupKind, ScheduleEntry, SchedulingInput};

pub use clauses::{emit, ClauseSink, EmitMode};
pub use encode::{Placement, VarTable};
pub use sat::{SatCore, SatOutcome};

/// The generation entry point handed to the API collaborator. Holds the
/// persistence collaborator and the injected settings; nothing is shared
/// between concurrent requests.
pub struct SatScheduler<S> {
    store: S,
    settings: Settings,
}

impl<S: ScheduleStore> SatScheduler<S> {
    pub fn new(store: S) -> Self {
        Self::with_settings(store, Settings::default())
    }

    pub fn with_settings(store: S, settings: Settings) -> Self {
        Self { store, settings }
    }

    /// Assembles, validates and solves one institution's timetable. Entries
    /// are returned, never persisted. The solve itself is a synchronous
    /// CPU-bound region; hosts on cooperative runtimes may wrap this call in
    /// a blocking task. `None` falls back to the settings timeout.
    pub async fn generate(
        &self,
        institution: InstitutionId,
        timeout: Option<Duration>,
    ) -> Result<Vec<ScheduleEntry>, GenerateError> {
        let input = assemble::build(&self.store, institution)
            .await
            .map_err(GenerateError::Store)?;
        validate(&input).map_err(|reason| GenerateError::InvalidInput { reason })?;
        let timeout =
            timeout.unwrap_or_else(|| Duration::from_secs(self.settings.solve_timeout_secs));
        generate_schedule(&input, timeout)
    }
}

/// The synchronous core of a generation request: encode variables, probe for
/// statically impossible pairs, stream the constraint system into a fresh
/// solver, solve, and decode or diagnose.
pub fn generate_schedule(
    input: &SchedulingInput,
    timeout: Duration,
) -> Result<Vec<ScheduleEntry>, GenerateError> {
    let mut table = VarTable::encode(input);
    info!(variables = table.var_count(), "encoded placement variables");

    let pairs = probe::infeasible_pairs(input, &table);
    if !pairs.is_empty() {
        return Err(GenerateError::Infeasible { pairs });
    }

    let mut core = SatCore::new();
    clauses::emit(input, &mut table, EmitMode::Full, &mut core).map_err(GenerateError::Solver)?;
    info!(
        clauses = core.clause_count(),
        next_var = table.next_var(),
        "compiled constraint system"
    );

    match core.solve(timeout).map_err(GenerateError::Solver)? {
        SatOutcome::Sat(model) => {
            let entries = decode(&table, &model);
            info!(entries = entries.len(), "schedule found");
            Ok(entries)
        }
        SatOutcome::Unsat => Err(diagnose(input, timeout)),
        SatOutcome::Timeout => Err(GenerateError::timeout(timeout.as_secs())),
    }
}

/// Positive literals with a placement become entries, in variable order;
/// cardinality auxiliaries decode to nothing.
fn decode(table: &VarTable, model: &[i32]) -> Vec<ScheduleEntry> {
    let mut entries = Vec::new();
    for &lit in model {
        if lit <= 0 {
            continue;
        }
        let Some(p) = table.tuple_of(lit) else {
            continue;
        };
        let Some(kind) = table.kind_of(p.group) else {
            continue;
        };
        let (class_group_id, study_group_id) = match kind {
            GroupKind::Class => (Some(p.group), None),
            GroupKind::Study => (None, Some(p.group)),
        };
        entries.push(ScheduleEntry {
            lesson_id: p.lesson,
            teacher_id: p.teacher,
            room_id: p.room,
            time_slot_id: p.slot,
            class_group_id,
            study_group_id,
        });
    }
    entries
}

/// UNSAT post-mortem: re-encode from scratch with the pairwise conflict
/// clauses suppressed and solve again. A satisfiable stripped formula means
/// the demand itself was placeable and resources collided; an unsatisfiable
/// one means capacity or unavailability removed every placement.
fn diagnose(input: &SchedulingInput, timeout: Duration) -> GenerateError {
    let mut table = VarTable::encode(input);
    let mut core = SatCore::new();
    if let Err(err) = clauses::emit(input, &mut table, EmitMode::SkipConflicts, &mut core) {
        return GenerateError::Solver(err);
    }
    match core.solve(timeout) {
        Ok(SatOutcome::Sat(_)) => GenerateError::resource_conflict(),
        Ok(SatOutcome::Unsat) => GenerateError::capacity_or_availability(),
        Ok(SatOutcome::Timeout) => GenerateError::timeout(timeout.as_secs()),
        Err(err) => GenerateError::Solver(err),
    }
}
