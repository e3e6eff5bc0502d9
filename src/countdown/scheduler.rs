//! Keeps the countdown labels of a task collection up to date

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::collection::TaskReceiver;
use crate::countdown::{task_remaining, Clock, SystemClock, Units};
use crate::task::{Task, TaskId};

/// The countdown label of every known task
pub type RemainingTimes = HashMap<TaskId, String>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
}

/// A periodic task that recomputes the countdown labels of a task collection.
///
/// Once [started](Self::start), it rebuilds the whole label map every `period` (one second by default), and whenever the collection changes.
/// It is stopped by [`Self::stop`], or when it is dropped.
pub struct Scheduler {
    period: Duration,
    units: Units,
    clock: Arc<dyn Clock>,

    times: Arc<watch::Sender<RemainingTimes>>,
    worker: Option<JoinHandle<()>>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// A stopped scheduler, that uses the local wall clock
    pub fn new() -> Self {
        let (times, _) = watch::channel(RemainingTimes::new());
        Self {
            period: crate::config::TICK_PERIOD,
            units: Units::default(),
            clock: Arc::new(SystemClock),
            times: Arc::new(times),
            worker: None,
        }
    }

    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn units(&self) -> &Units {
        &self.units
    }

    pub fn state(&self) -> SchedulerState {
        match &self.worker {
            Some(worker) if worker.is_finished() == false => SchedulerState::Running,
            _ => SchedulerState::Stopped,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == SchedulerState::Running
    }

    /// Start ticking over the collection `tasks` reads from.
    ///
    /// If the scheduler was already running, its previous loop is cancelled first.
    /// This must be called from within a tokio runtime.
    pub fn start(&mut self, tasks: TaskReceiver) {
        self.stop();

        log::debug!("Starting the countdown scheduler (every {:?})", self.period);
        let worker = tokio::spawn(run(
            tasks,
            Arc::clone(&self.times),
            Arc::clone(&self.clock),
            self.units,
            self.period,
        ));
        self.worker = Some(worker);
    }

    /// Cancel the loop. Labels stay as they were computed last
    pub fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            log::debug!("Stopping the countdown scheduler");
            worker.abort();
        }
    }

    /// A copy of the current labels
    pub fn remaining_times(&self) -> RemainingTimes {
        self.times.borrow().clone()
    }

    /// The current label of a task, if it has been computed
    pub fn remaining_for(&self, id: &TaskId) -> Option<String> {
        self.times.borrow().get(id).cloned()
    }

    /// The current label of a task, or the "pending" label in case it has not been computed yet
    pub fn label_for(&self, id: &TaskId) -> String {
        self.remaining_for(id)
            .unwrap_or_else(|| self.units.pending.to_string())
    }

    /// Get notified whenever the labels are recomputed
    pub fn subscribe(&self) -> watch::Receiver<RemainingTimes> {
        self.times.subscribe()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}


/// Rebuild the labels of every task, from scratch.
///
/// Each task is evaluated on its own: a task with an invalid deadline is labelled as expired, and does not affect the others.
fn compute(tasks: &[Task], clock: &dyn Clock, units: &Units) -> RemainingTimes {
    let now = clock.now();
    tasks.iter()
        .map(|task| (task.id().clone(), task_remaining(task, now, units)))
        .collect()
}

async fn run(
    mut tasks: TaskReceiver,
    times: Arc<watch::Sender<RemainingTimes>>,
    clock: Arc<dyn Clock>,
    units: Units,
    period: Duration,
) {
    loop {
        // (Re-)arm: refresh right away, then once per period
        let labels = compute(&tasks.borrow_and_update(), clock.as_ref(), &units);
        times.send_replace(labels);

        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let labels = compute(&tasks.borrow(), clock.as_ref(), &units);
                    times.send_replace(labels);
                },
                changed = tasks.changed() => {
                    if changed.is_err() {
                        log::debug!("The task collection is gone, stopping the countdown");
                        return;
                    }
                    log::trace!("The task collection has changed, re-arming the countdown");
                    break;
                },
            }
        }
    }
}
