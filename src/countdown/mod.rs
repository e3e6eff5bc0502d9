//! Time remaining until task deadlines
//!
//! [`remaining`] formats the time left before a deadline. The [`scheduler`] keeps such labels up to date for a whole collection of tasks.

use chrono::{DateTime, Duration, Local, TimeZone, Utc};

use crate::task::{parse_deadline_in, Task};

pub mod scheduler;

/// The words used in countdown labels
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Units {
    pub hours: &'static str,
    pub minutes: &'static str,
    pub seconds: &'static str,
    /// The whole label once a deadline has passed
    pub expired: &'static str,
    /// The whole label of a task whose countdown has not been computed yet
    pub pending: &'static str,
}

impl Units {
    pub const ENGLISH: Units = Units {
        hours: "h",
        minutes: "m",
        seconds: "s",
        expired: "Time's up!",
        pending: "Calculating...",
    };

    pub const INDONESIAN: Units = Units {
        hours: "j",
        minutes: "m",
        seconds: "d",
        expired: "Waktu habis!",
        pending: "Menghitung...",
    };
}

impl Default for Units {
    fn default() -> Self {
        Self::ENGLISH
    }
}


/// A source for the current instant
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that starts at a given time, and then follows the tokio clock.
///
/// When tokio time is paused (e.g. in tests), this clock only moves when tokio time is advanced.
#[derive(Clone, Copy, Debug)]
pub struct AnchoredClock {
    anchor: DateTime<Utc>,
    origin: tokio::time::Instant,
}

impl AnchoredClock {
    /// A clock that reads `anchor` right now
    pub fn starting_at(anchor: DateTime<Utc>) -> Self {
        Self { anchor, origin: tokio::time::Instant::now() }
    }
}

impl Clock for AnchoredClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = Duration::from_std(self.origin.elapsed())
            .unwrap_or_else(|_| Duration::max_value());
        self.anchor.checked_add_signed(elapsed)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}


/// The time left before `deadline`, e.g. `"1h 5m 42s"`, or the expired label if `deadline` is not after `now`.
///
/// Deadlines without an offset are local times. Unparseable deadlines are expired.
pub fn remaining(deadline: &str, now: DateTime<Utc>) -> String {
    remaining_with_units(deadline, now, &Units::default())
}

/// Same as [`remaining`], in other words
pub fn remaining_with_units(deadline: &str, now: DateTime<Utc>, units: &Units) -> String {
    remaining_in(deadline, now, &Local, units)
}

/// Same as [`remaining_with_units`], with offset-less deadlines read as wall-clock times of `tz`
pub fn remaining_in<Tz: TimeZone>(deadline: &str, now: DateTime<Utc>, tz: &Tz, units: &Units) -> String {
    match parse_deadline_in(deadline, tz) {
        None => units.expired.to_string(),
        Some(deadline) => format_remaining(deadline.signed_duration_since(now), units),
    }
}

/// The countdown label of a task
pub fn task_remaining(task: &Task, now: DateTime<Utc>, units: &Units) -> String {
    match task.deadline_time() {
        None => {
            log::trace!("Task {} has an unparseable deadline {:?}", task.id(), task.deadline());
            units.expired.to_string()
        },
        Some(deadline) => format_remaining(deadline.signed_duration_since(now), units),
    }
}

/// Whole hours, minutes and seconds (rounded down) of a time left
pub fn format_remaining(delta: Duration, units: &Units) -> String {
    if delta <= Duration::zero() {
        return units.expired.to_string();
    }

    let total_seconds = delta.num_seconds();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}{} {}{} {}{}", hours, units.hours, minutes, units.minutes, seconds, units.seconds)
}
