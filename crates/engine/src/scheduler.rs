//! Scheduler: turns a `ScheduledTask`'s cron expression into fire times and
//! drains them on the engine's own tick loop (spec §4.7). No separate
//! job-store process; `ScheduledTaskStore`/`TaskExecutionStore` are the
//! durable state, the tick loop is driven by the daemon's own interval.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use parking_lot::Mutex;
use tracing::{info, warn};

use netcfg_adapters::DeviceSessionAdapter;
use netcfg_core::{
    Clock, IdGen, ScheduledTask, ScheduledTaskId, TaskExecution, TaskExecutionId, TaskExecutionStatus,
    TaskStatus, TaskType,
};
use netcfg_storage::{ScheduledTaskStore, TaskExecutionStore, TaskStore};

use crate::error::{OrchestratorError, ScheduleError};
use crate::worker::{CredentialResolver, WorkerPool};

/// Default scheduler timezone, overridden by `NETCFG_SCHEDULER_TZ`.
pub const DEFAULT_TZ: &str = "Asia/Shanghai";

/// A fire more than this late (e.g. the daemon was down) is skipped
/// entirely and rescheduled to the next matching instant.
fn misfire_grace() -> Duration {
    Duration::seconds(300)
}

/// Resolves a timezone name, falling back to [`DEFAULT_TZ`] for anything
/// `chrono-tz` doesn't recognize.
pub fn parse_timezone(name: &str) -> Tz {
    name.parse::<Tz>()
        .unwrap_or_else(|_| DEFAULT_TZ.parse::<Tz>().unwrap_or(chrono_tz::Asia::Shanghai))
}

/// Validates a five-field cron expression (minute hour day month dow).
pub fn validate(expr: &str) -> Result<(), ScheduleError> {
    CronSchedule::parse(expr).map(|_| ())
}

/// Computes the next wall-clock time strictly after `from` that matches
/// `expr` in timezone `tz`. Pure function of its three inputs.
pub fn next_fire_time(expr: &str, from: DateTime<Utc>, tz: Tz) -> Result<DateTime<Utc>, ScheduleError> {
    let schedule = CronSchedule::parse(expr)?;
    let local_from = from.with_timezone(&tz);
    let mut candidate = truncate_to_minute(local_from.naive_local()) + Duration::minutes(1);

    const MAX_STEPS: i64 = 60 * 24 * 366 * 4;
    for _ in 0..MAX_STEPS {
        let dow = candidate.weekday().num_days_from_sunday();
        if schedule.matches(candidate.minute(), candidate.hour(), candidate.day(), candidate.month(), dow) {
            if let Some(dt) = tz.from_local_datetime(&candidate).single() {
                return Ok(dt.with_timezone(&Utc));
            }
        }
        candidate += Duration::minutes(1);
    }
    Err(ScheduleError::Unsatisfiable(expr.to_string()))
}

fn truncate_to_minute(dt: NaiveDateTime) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(dt.year(), dt.month(), dt.day())
        .and_then(|d| d.and_hms_opt(dt.hour(), dt.minute(), 0))
        .unwrap_or(dt)
}

#[derive(Debug, Clone)]
struct CronSchedule {
    minute: Vec<u32>,
    hour: Vec<u32>,
    day: Vec<u32>,
    month: Vec<u32>,
    dow: Vec<u32>,
}

impl CronSchedule {
    fn parse(expr: &str) -> Result<Self, ScheduleError> {
        let fields: Vec<&str> = expr.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(ScheduleError::WrongFieldCount(expr.to_string()));
        }
        Ok(Self {
            minute: parse_field(fields[0], "minute", 0, 59)?,
            hour: parse_field(fields[1], "hour", 0, 23)?,
            day: parse_field(fields[2], "day", 1, 31)?,
            month: parse_field(fields[3], "month", 1, 12)?,
            dow: parse_field(fields[4], "dow", 0, 6)?,
        })
    }

    fn matches(&self, minute: u32, hour: u32, day: u32, month: u32, dow: u32) -> bool {
        self.minute.contains(&minute)
            && self.hour.contains(&hour)
            && self.day.contains(&day)
            && self.month.contains(&month)
            && self.dow.contains(&dow)
    }
}

fn parse_field(raw: &str, name: &'static str, min: u32, max: u32) -> Result<Vec<u32>, ScheduleError> {
    if raw == "*" {
        return Ok((min..=max).collect());
    }
    let mut values = Vec::new();
    for part in raw.split(',') {
        if let Some((lo, hi)) = part.split_once('-') {
            let lo: u32 = lo.parse().map_err(|_| invalid(name, raw, "range bound is not an integer"))?;
            let hi: u32 = hi.parse().map_err(|_| invalid(name, raw, "range bound is not an integer"))?;
            if lo > hi || lo < min || hi > max {
                return Err(invalid(name, raw, "range out of domain"));
            }
            values.extend(lo..=hi);
        } else {
            let v: u32 = part.parse().map_err(|_| invalid(name, raw, "value is not an integer"))?;
            if v < min || v > max {
                return Err(invalid(name, raw, "value out of domain"));
            }
            values.push(v);
        }
    }
    values.sort_unstable();
    values.dedup();
    Ok(values)
}

fn invalid(field: &'static str, value: &str, reason: &'static str) -> ScheduleError {
    ScheduleError::InvalidField { field, value: value.to_string(), reason }
}

/// Drives recurring jobs: validates and installs `ScheduledTask`s, fires them
/// on `tick()`, and reconciles their `TaskExecution` once all spawned
/// `BackupTask`s reach a terminal state.
pub struct Scheduler<A: DeviceSessionAdapter, C: Clock, I: IdGen, V: CredentialResolver> {
    scheduled_store: Arc<ScheduledTaskStore>,
    execution_store: Arc<TaskExecutionStore>,
    task_store: Arc<TaskStore>,
    worker_pool: Arc<WorkerPool<A, C, I, V>>,
    clock: C,
    id_gen: I,
    tz: Tz,
    running: Mutex<HashSet<ScheduledTaskId>>,
    /// Which `BackupTask`s belong to an open execution. Engine-internal
    /// bookkeeping, not part of the persisted domain model (spec §9: no
    /// execution/task linkage column in the `backup_tasks` schema) — reset
    /// on restart, at which point `reconcile_executions` simply cannot
    /// close executions left open across a crash, matching the host
    /// daemon's own "best-effort" shutdown reconciliation.
    execution_tasks: Mutex<HashMap<TaskExecutionId, Vec<netcfg_core::BackupTaskId>>>,
}

impl<A, C, I, V> Scheduler<A, C, I, V>
where
    A: DeviceSessionAdapter + 'static,
    C: Clock + Clone + 'static,
    I: IdGen + 'static,
    V: CredentialResolver + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        scheduled_store: Arc<ScheduledTaskStore>,
        execution_store: Arc<TaskExecutionStore>,
        task_store: Arc<TaskStore>,
        worker_pool: Arc<WorkerPool<A, C, I, V>>,
        clock: C,
        id_gen: I,
        tz: Tz,
    ) -> Self {
        Self {
            scheduled_store,
            execution_store,
            task_store,
            worker_pool,
            clock,
            id_gen,
            tz,
            running: Mutex::new(HashSet::new()),
            execution_tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Validates and persists a job, computing its initial `next_run_at`.
    /// Replaces any existing job with the same id.
    pub async fn install(&self, mut task: ScheduledTask) -> Result<ScheduledTask, OrchestratorError> {
        validate(&task.cron_expression)?;
        let next = next_fire_time(&task.cron_expression, self.clock.now(), self.tz)?;
        task.next_run_at = Some(next);
        let _ = self.scheduled_store.remove(&task.id).await;
        self.scheduled_store.insert(&task).await?;
        Ok(task)
    }

    pub async fn uninstall(&self, id: &ScheduledTaskId) -> Result<(), OrchestratorError> {
        self.scheduled_store.remove(id).await?;
        Ok(())
    }

    /// One tick: fires every due job (subject to coalesce/max_instances/misfire
    /// grace), then reconciles open executions whose children are all terminal.
    pub async fn tick(&self) {
        let now = self.clock.now();
        let due = match self.scheduled_store.list_active().await {
            Ok(jobs) => jobs,
            Err(e) => {
                warn!(error = %e, "scheduler: failed to list active jobs");
                return;
            }
        };
        for job in due {
            let Some(next_run_at) = job.next_run_at else { continue };
            if next_run_at > now {
                continue;
            }
            if now - next_run_at > misfire_grace() {
                info!(scheduled_task_id = %job.id, "scheduler: misfire grace exceeded, skipping fire");
                self.reschedule_only(&job, now).await;
                continue;
            }
            if self.running.lock().contains(&job.id) {
                info!(scheduled_task_id = %job.id, "scheduler: job already running, skipping overlapping fire");
                self.reschedule_only(&job, now).await;
                continue;
            }
            self.run_scheduled(job).await;
        }
        self.reconcile_executions().await;
    }

    /// Advances `next_run_at` without opening a new execution (used for
    /// coalesced/skipped fires).
    async fn reschedule_only(&self, job: &ScheduledTask, now: DateTime<Utc>) {
        match next_fire_time(&job.cron_expression, now, self.tz) {
            Ok(next) => {
                if let Err(e) = self.scheduled_store.update_run_times(&job.id, job.last_run_at, Some(next)).await {
                    warn!(scheduled_task_id = %job.id, error = %e, "scheduler: failed to reschedule job");
                }
            }
            Err(e) => warn!(scheduled_task_id = %job.id, error = %e, "scheduler: cannot compute next fire time"),
        }
    }

    /// Reloads and fires one job: opens a `TaskExecution`, submits the
    /// target batch, and records the next fire time (spec §4.7).
    pub async fn run_scheduled(&self, job: ScheduledTask) {
        if !job.active {
            return;
        }
        self.running.lock().insert(job.id.clone());
        let now = self.clock.now();

        let execution_id = TaskExecutionId::new(self.id_gen.next());
        let mut execution = TaskExecution::open(execution_id.clone(), job.id.clone(), now);
        if let Err(e) = self.execution_store.open(&execution).await {
            warn!(scheduled_task_id = %job.id, error = %e, "scheduler: failed to open task execution");
            self.running.lock().remove(&job.id);
            return;
        }

        let next_run_at = match next_fire_time(&job.cron_expression, now, self.tz) {
            Ok(t) => Some(t),
            Err(e) => {
                warn!(scheduled_task_id = %job.id, error = %e, "scheduler: cannot compute next fire time after firing");
                None
            }
        };
        if let Err(e) = self.scheduled_store.update_run_times(&job.id, Some(now), next_run_at).await {
            warn!(scheduled_task_id = %job.id, error = %e, "scheduler: failed to record run times");
        }

        match self
            .worker_pool
            .submit_batch(&job.target_device_ids, "scheduler", TaskType::Scheduled, Some(&job.capture_command))
            .await
        {
            Ok(task_ids) => {
                self.execution_tasks.lock().insert(execution_id, task_ids);
            }
            Err(e) => {
                warn!(scheduled_task_id = %job.id, error = %e, "scheduler: batch submission failed");
                execution.status = TaskExecutionStatus::Failed;
                execution.completed_at = Some(self.clock.now());
                execution.error_message = Some(e.to_string());
                execution.result_summary = Some("batch submission failed".to_string());
                if let Err(e) = self.execution_store.close(&execution).await {
                    warn!(execution_id = %execution.id, error = %e, "scheduler: failed to close failed execution");
                }
                self.running.lock().remove(&job.id);
            }
        }
    }

    /// Closes every open `TaskExecution` whose spawned `BackupTask`s have all
    /// reached a terminal state (spec §4.7 reconciliation pass).
    pub async fn reconcile_executions(&self) {
        let running_executions = match self.execution_store.list_running().await {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %e, "scheduler: failed to list running executions");
                return;
            }
        };
        for mut execution in running_executions {
            let Some(task_ids) = self.execution_tasks.lock().get(&execution.id).cloned() else {
                continue;
            };

            let mut success = 0usize;
            let mut failed = 0usize;
            let mut all_terminal = true;
            for task_id in &task_ids {
                match self.task_store.get(task_id).await {
                    Ok(task) if task.status.is_terminal() => {
                        if task.status == TaskStatus::Success {
                            success += 1;
                        } else {
                            failed += 1;
                        }
                    }
                    Ok(_) => {
                        all_terminal = false;
                        break;
                    }
                    Err(e) => {
                        warn!(task_id = %task_id, error = %e, "scheduler: could not load child task during reconciliation");
                        all_terminal = false;
                        break;
                    }
                }
            }
            if !all_terminal {
                continue;
            }

            let scheduled_task_id = execution.scheduled_task_id.clone();
            execution.close(self.clock.now(), success, failed);
            if let Err(e) = self.execution_store.close(&execution).await {
                warn!(execution_id = %execution.id, error = %e, "scheduler: failed to close task execution");
            } else {
                self.execution_tasks.lock().remove(&execution.id);
            }
            self.running.lock().remove(&scheduled_task_id);
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
