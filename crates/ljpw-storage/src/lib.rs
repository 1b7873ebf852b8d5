//! DuckDB-backed persistence for LJPW engine runs.

#[cfg(target_os = "windows")]
#[link(name = "rstrtmgr")]
unsafe extern "system" {}

use duckdb::{Connection, Transaction, params};
use ljpw_core::{IterationOutcome, Phase, StateVector, StepRecord, StepSink};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

const DEFAULT_STEP_BUFFER: usize = 256;
const DEFAULT_IMPROVEMENT_BUFFER: usize = 64;
/// Run label used until [`Storage::with_run`] picks another.
pub const DEFAULT_RUN: &str = "default";

/// Storage error wrapper.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("duckdb error: {0}")]
    DuckDb(#[from] duckdb::Error),
    #[error("unrecognised phase label {0:?}")]
    UnknownPhase(String),
}

/// Row written to the `steps` table.
#[derive(Debug, Clone)]
struct StepRow {
    run: String,
    step: i64,
    time: f64,
    state: StateVector,
    force: [f64; 4],
    efficiency: f64,
    entropy: f64,
    entropy_production: f64,
    harmony: f64,
    consciousness: f64,
    phase: &'static str,
}

/// Row written to the `improvements` table.
#[derive(Debug, Clone)]
struct ImprovementRow {
    run: String,
    seq: i64,
    iteration: i64,
    score: f64,
    best_score: f64,
    accepted: bool,
    relative_gain: f64,
}

/// One persisted point of a run's trajectory.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct TrajectoryPoint {
    pub step: i64,
    pub time: f64,
    pub state: StateVector,
    pub efficiency: f64,
    pub harmony: f64,
    pub phase: Phase,
}

/// Aggregate efficiency statistics for one run.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct EfficiencySummary {
    pub steps: i64,
    pub mean: f64,
    pub max: f64,
    /// Efficiency at the highest recorded step.
    pub final_efficiency: f64,
}

#[derive(Default)]
struct StorageBuffer {
    steps: Vec<StepRow>,
    improvements: Vec<ImprovementRow>,
    /// Delete the run's persisted steps before inserting the buffered ones.
    restart_run: bool,
}

impl StorageBuffer {
    fn is_empty(&self) -> bool {
        self.steps.is_empty() && self.improvements.is_empty() && !self.restart_run
    }

    fn clear(&mut self) {
        self.steps.clear();
        self.improvements.clear();
        self.restart_run = false;
    }
}

fn parse_phase(label: &str) -> Result<Phase, StorageError> {
    match label {
        "AUTOPOIETIC" => Ok(Phase::Autopoietic),
        "HOMEOSTATIC" => Ok(Phase::Homeostatic),
        "ENTROPIC" => Ok(Phase::Entropic),
        other => Err(StorageError::UnknownPhase(other.to_string())),
    }
}

/// DuckDB-backed step sink with buffered writes.
pub struct Storage {
    conn: Connection,
    buffer: StorageBuffer,
    run: String,
    next_improvement_seq: i64,
    step_flush_threshold: usize,
    improvement_flush_threshold: usize,
}

impl Storage {
    /// Open or create a DuckDB database at the provided path with default buffering thresholds.
    pub fn open(path: &str) -> Result<Self, StorageError> {
        Self::with_thresholds(path, DEFAULT_STEP_BUFFER, DEFAULT_IMPROVEMENT_BUFFER)
    }

    /// Override flush thresholds for steps and improvements respectively.
    pub fn with_thresholds(
        path: &str,
        step: usize,
        improvement: usize,
    ) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        let mut storage = Self {
            conn,
            buffer: StorageBuffer::default(),
            run: DEFAULT_RUN.to_string(),
            next_improvement_seq: 0,
            step_flush_threshold: step.max(1),
            improvement_flush_threshold: improvement.max(1),
        };
        storage.initialize_schema()?;
        storage.sync_improvement_seq()?;
        Ok(storage)
    }

    /// Label subsequent rows with `run`.
    pub fn with_run(mut self, run: impl Into<String>) -> Result<Self, StorageError> {
        self.flush()?;
        self.run = run.into();
        self.sync_improvement_seq()?;
        Ok(self)
    }

    #[must_use]
    pub fn run(&self) -> &str {
        &self.run
    }

    fn initialize_schema(&mut self) -> Result<(), StorageError> {
        self.conn.execute(
            "create table if not exists steps (
                run text,
                step bigint,
                time double,
                love double,
                justice double,
                power double,
                wisdom double,
                force_love double,
                force_justice double,
                force_power double,
                force_wisdom double,
                efficiency double,
                entropy double,
                entropy_production double,
                harmony double,
                consciousness double,
                phase text,
                primary key (run, step)
            )",
            [],
        )?;
        self.conn.execute(
            "create table if not exists improvements (
                run text,
                seq bigint,
                iteration bigint,
                score double,
                best_score double,
                accepted boolean,
                relative_gain double,
                primary key (run, seq)
            )",
            [],
        )?;
        Ok(())
    }

    /// Continue the improvement sequence of an existing run instead of overwriting it.
    fn sync_improvement_seq(&mut self) -> Result<(), StorageError> {
        let max: Option<i64> = self.conn.query_row(
            "select max(seq) from improvements where run = ?",
            params![self.run],
            |row| row.get(0),
        )?;
        self.next_improvement_seq = max.map_or(0, |seq| seq + 1);
        Ok(())
    }

    /// Buffer one step record, flushing once the threshold is reached.
    ///
    /// A record with index 0 starts a new trajectory: the run's earlier steps, persisted or
    /// buffered, are replaced on the next flush. Optimizer iterations are kept.
    pub fn persist_step(&mut self, record: &StepRecord) -> Result<(), StorageError> {
        if record.index == 0 {
            self.buffer.steps.clear();
            self.buffer.restart_run = true;
        }
        self.buffer.steps.push(StepRow {
            run: self.run.clone(),
            step: record.index as i64,
            time: record.time,
            state: record.state,
            force: record.forces.to_array(),
            efficiency: record.efficiency,
            entropy: record.entropy,
            entropy_production: record.entropy_production,
            harmony: record.harmony,
            consciousness: record.consciousness,
            phase: record.phase.as_str(),
        });
        self.maybe_flush()
    }

    /// Buffer one optimizer iteration, flushing once the threshold is reached.
    pub fn persist_improvement(&mut self, outcome: &IterationOutcome) -> Result<(), StorageError> {
        self.buffer.improvements.push(ImprovementRow {
            run: self.run.clone(),
            seq: self.next_improvement_seq,
            iteration: outcome.iteration as i64,
            score: outcome.score,
            best_score: outcome.best_score,
            accepted: outcome.accepted,
            relative_gain: outcome.relative_gain,
        });
        self.next_improvement_seq += 1;
        self.maybe_flush()
    }

    fn maybe_flush(&mut self) -> Result<(), StorageError> {
        if self.buffer.steps.len() >= self.step_flush_threshold
            || self.buffer.improvements.len() >= self.improvement_flush_threshold
        {
            self.flush()?;
        }
        Ok(())
    }

    fn insert_steps(tx: &Transaction<'_>, rows: &[StepRow]) -> Result<(), duckdb::Error> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut stmt = tx.prepare(
            "insert or replace into steps (
                run, step, time, love, justice, power, wisdom,
                force_love, force_justice, force_power, force_wisdom,
                efficiency, entropy, entropy_production, harmony, consciousness, phase
            ) values (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )?;
        for row in rows {
            stmt.execute(params![
                row.run,
                row.step,
                row.time,
                row.state.l,
                row.state.j,
                row.state.p,
                row.state.w,
                row.force[0],
                row.force[1],
                row.force[2],
                row.force[3],
                row.efficiency,
                row.entropy,
                row.entropy_production,
                row.harmony,
                row.consciousness,
                row.phase,
            ])?;
        }
        Ok(())
    }

    fn insert_improvements(
        tx: &Transaction<'_>,
        rows: &[ImprovementRow],
    ) -> Result<(), duckdb::Error> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut stmt = tx.prepare(
            "insert or replace into improvements (
                run, seq, iteration, score, best_score, accepted, relative_gain
            ) values (?, ?, ?, ?, ?, ?, ?)",
        )?;
        for row in rows {
            stmt.execute(params![
                row.run,
                row.seq,
                row.iteration,
                row.score,
                row.best_score,
                row.accepted,
                row.relative_gain,
            ])?;
        }
        Ok(())
    }

    /// Force flush buffered records to disk.
    pub fn flush(&mut self) -> Result<(), StorageError> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let tx = self.conn.transaction()?;
        if self.buffer.restart_run {
            tx.execute("delete from steps where run = ?", params![self.run])?;
        }
        Self::insert_steps(&tx, &self.buffer.steps)?;
        Self::insert_improvements(&tx, &self.buffer.improvements)?;
        tx.commit()?;
        self.buffer.clear();
        Ok(())
    }

    /// Return up to `limit` trajectory points of `run` in step order.
    pub fn trajectory(
        &mut self,
        run: &str,
        limit: usize,
    ) -> Result<Vec<TrajectoryPoint>, StorageError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.flush()?;
        let mut stmt = self.conn.prepare(
            "select step, time, love, justice, power, wisdom, efficiency, harmony, phase
             from steps
             where run = ?
             order by step asc
             limit ?",
        )?;
        let mut rows = stmt.query(params![run, limit as i64])?;
        let mut points = Vec::with_capacity(limit.min(1_024));
        while let Some(row) = rows.next()? {
            let phase: String = row.get(8)?;
            points.push(TrajectoryPoint {
                step: row.get(0)?,
                time: row.get(1)?,
                state: StateVector::new(row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?),
                efficiency: row.get(6)?,
                harmony: row.get(7)?,
                phase: parse_phase(&phase)?,
            });
        }
        Ok(points)
    }

    /// Count, mean, max and final efficiency for `run`, or `None` if nothing was recorded.
    pub fn efficiency_summary(
        &mut self,
        run: &str,
    ) -> Result<Option<EfficiencySummary>, StorageError> {
        self.flush()?;
        let (steps, mean, max, final_efficiency): (i64, Option<f64>, Option<f64>, Option<f64>) =
            self.conn.query_row(
                "select count(*), avg(efficiency), max(efficiency), arg_max(efficiency, step)
                 from steps
                 where run = ?",
                params![run],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?;
        Ok(match (mean, max, final_efficiency) {
            (Some(mean), Some(max), Some(final_efficiency)) if steps > 0 => {
                Some(EfficiencySummary {
                    steps,
                    mean,
                    max,
                    final_efficiency,
                })
            }
            _ => None,
        })
    }

    /// Every persisted optimizer iteration of `run`, oldest first.
    pub fn improvements(&mut self, run: &str) -> Result<Vec<IterationOutcome>, StorageError> {
        self.flush()?;
        let mut stmt = self.conn.prepare(
            "select iteration, score, best_score, accepted, relative_gain
             from improvements
             where run = ?
             order by seq asc",
        )?;
        let mut rows = stmt.query(params![run])?;
        let mut outcomes = Vec::new();
        while let Some(row) = rows.next()? {
            outcomes.push(IterationOutcome {
                iteration: row.get::<_, i64>(0)? as usize,
                score: row.get(1)?,
                best_score: row.get(2)?,
                accepted: row.get(3)?,
                relative_gain: row.get(4)?,
            });
        }
        Ok(outcomes)
    }

    /// Distinct run labels with at least one persisted step.
    pub fn runs(&mut self) -> Result<Vec<String>, StorageError> {
        self.flush()?;
        let mut stmt = self
            .conn
            .prepare("select distinct run from steps order by run asc")?;
        let mut rows = stmt.query([])?;
        let mut runs = Vec::new();
        while let Some(row) = rows.next()? {
            runs.push(row.get(0)?);
        }
        Ok(runs)
    }
}

impl Drop for Storage {
    fn drop(&mut self) {
        if let Err(err) = self.flush() {
            warn!(%err, "failed to flush storage buffer on drop");
        }
    }
}

impl StepSink for Storage {
    fn on_step(&mut self, record: &StepRecord) {
        if let Err(err) = self.persist_step(record) {
            warn!(%err, step = record.index, "failed to persist step");
        }
    }

    fn on_improvement(&mut self, outcome: &IterationOutcome) {
        if let Err(err) = self.persist_improvement(outcome) {
            warn!(%err, iteration = outcome.iteration, "failed to persist optimizer iteration");
        }
    }
}
