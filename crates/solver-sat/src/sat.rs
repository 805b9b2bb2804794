use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use rustsat::solvers::{Interrupt, InterruptSolver, Solve, SolverResult};
use rustsat::types::{Clause, Lit, TernaryVal};
use rustsat_glucose::core::Glucose;

use crate::clauses::ClauseSink;

#[derive(Clone, Debug)]
pub enum SatOutcome {
    /// Full model as signed literals for variables `1..=max_var`; only the
    /// positive ones matter for decoding.
    Sat(Vec<i32>),
    Unsat,
    Timeout,
}

/// One Glucose instance per generation request. Clauses stream in through
/// [`ClauseSink`]; solving consumes the core, so nothing can be reused.
pub struct SatCore {
    solver: Glucose,
    max_var: i32,
    clause_count: usize,
}

impl SatCore {
    pub fn new() -> Self {
        Self {
            solver: Glucose::default(),
            max_var: 0,
            clause_count: 0,
        }
    }

    pub fn clause_count(&self) -> usize {
        self.clause_count
    }

    /// Runs the CDCL search, interrupting it from a watchdog thread when the
    /// budget elapses. Partial assignments from an interrupted run are
    /// discarded.
    pub fn solve(mut self, timeout: Duration) -> anyhow::Result<SatOutcome> {
        let interrupter = self.solver.interrupter();
        let (done_tx, done_rx) = mpsc::channel::<()>();
        let watchdog = thread::spawn(move || {
            if done_rx.recv_timeout(timeout).is_err() {
                interrupter.interrupt();
            }
        });
        let result = self.solver.solve();
        let _ = done_tx.send(());
        let _ = watchdog.join();

        match result.context("sat backend failed")? {
            SolverResult::Sat => {
                let mut model = Vec::with_capacity(self.max_var as usize);
                for var in 1..=self.max_var {
                    let value = self
                        .solver
                        .lit_val(lit_from(var))
                        .context("model extraction failed")?;
                    model.push(if value == TernaryVal::True { var } else { -var });
                }
                Ok(SatOutcome::Sat(model))
            }
            SolverResult::Unsat => Ok(SatOutcome::Unsat),
            SolverResult::Interrupted => Ok(SatOutcome::Timeout),
        }
    }
}

impl Default for SatCore {
    fn default() -> Self {
        Self::new()
    }
}

impl ClauseSink for SatCore {
    fn add(&mut self, lits: &[i32]) -> anyhow::Result<()> {
        for &lit in lits {
            self.max_var = self.max_var.max(lit.abs());
        }
        let clause: Clause = lits.iter().map(|&lit| lit_from(lit)).collect();
        self.solver.add_clause(clause).context("adding clause failed")?;
        self.clause_count += 1;
        Ok(())
    }
}

fn lit_from(lit: i32) -> Lit {
    debug_assert!(lit != 0);
    if lit > 0 {
        Lit::positive((lit - 1) as u32)
    } else {
        Lit::negative((-lit - 1) as u32)
    }
}
