//! ==============================================================================
//! reconciler.rs - relative/absolute time reconciliation
//! ==============================================================================
//!
//! purpose:
//! ```text
//!     turns a decoded `StreamMessage` into absolute, display-adjusted samples.
//!
//!     display-adjusted means "utc milliseconds shifted by the local utc
//!     offset", which is what a time-axis chart expecting wall-clock millis
//!     needs to show the right hour regardless of the viewer's timezone.
//! ```
//!
//! snapshot algorithm:
//! ```text
//!     keys are minute counts. the largest key is the newest point and maps
//!     to "now"; every other key sits (max - key) minutes before it. keys are
//!     not assumed to start at 0 or be contiguous, and their text order is
//!     never trusted: entries are stable-sorted numerically. when two keys
//!     parse to the same number ("5" and "05") the later one in wire order
//!     wins.
//! ```
//!
//! relationships:
//! ```text
//!     - used by: dispatcher.rs (second stage of the pipeline)
//!     - feeds: buffer.rs (replace_all / append)
//! ```
//!
//! ==============================================================================

use chrono::{Local, Offset, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

use crate::domain::{Readings, Sample, StreamMessage};
use crate::error::ReconcileError;

pub const MINUTE_MS: i64 = 60_000;

// ==============================================================================
// clocks
// ==============================================================================

/// source of "now" for anchoring samples
pub trait Clock {
    /// milliseconds since the unix epoch, utc
    fn now_utc_ms(&self) -> i64;

    /// signed offset of local time from utc at the given instant, in ms
    /// (positive east of greenwich)
    fn utc_offset_ms(&self, utc_ms: i64) -> i64;

    /// current display-adjusted time
    fn display_now(&self) -> i64 {
        let now = self.now_utc_ms();
        now + self.utc_offset_ms(now)
    }
}

/// wall clock, localized with the machine timezone or a configured offset
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    fixed_offset_ms: Option<i64>,
}

impl SystemClock {
    /// use the host's timezone rules (dst aware)
    pub fn local() -> Self {
        Self { fixed_offset_ms: None }
    }

    /// pin the display offset, e.g. when the viewer is in another timezone
    /// than the machine running the dashboard
    pub fn with_offset_minutes(minutes: i32) -> Self {
        Self {
            fixed_offset_ms: Some(i64::from(minutes) * MINUTE_MS),
        }
    }
}

impl Clock for SystemClock {
    fn now_utc_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn utc_offset_ms(&self, utc_ms: i64) -> i64 {
        if let Some(offset) = self.fixed_offset_ms {
            return offset;
        }
        Local
            .timestamp_millis_opt(utc_ms)
            .single()
            .map(|dt| i64::from(dt.offset().fix().local_minus_utc()) * 1000)
            .unwrap_or(0)
    }
}

/// manually driven clock for tests and replays
#[derive(Debug, Default)]
pub struct FixedClock {
    utc_ms: AtomicI64,
    offset_ms: i64,
}

impl FixedClock {
    pub fn new(utc_ms: i64, offset_ms: i64) -> Self {
        Self {
            utc_ms: AtomicI64::new(utc_ms),
            offset_ms,
        }
    }

    pub fn advance(&self, ms: i64) {
        self.utc_ms.fetch_add(ms, Ordering::Relaxed);
    }
}

impl Clock for FixedClock {
    fn now_utc_ms(&self) -> i64 {
        self.utc_ms.load(Ordering::Relaxed)
    }

    fn utc_offset_ms(&self, _utc_ms: i64) -> i64 {
        self.offset_ms
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_utc_ms(&self) -> i64 {
        (**self).now_utc_ms()
    }

    fn utc_offset_ms(&self, utc_ms: i64) -> i64 {
        (**self).utc_offset_ms(utc_ms)
    }
}

// ==============================================================================
// reconciler
// ==============================================================================

/// what the buffer should do with a reconciled message
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciled {
    /// snapshot: discard everything and install these, ascending in time
    Replace(Vec<Sample>),
    /// update: one new sample at the end
    Append(Sample),
}

#[derive(Debug, Default)]
pub struct Reconciler<C> {
    clock: C,
}

impl<C: Clock> Reconciler<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn reconcile(&self, message: StreamMessage) -> Result<Reconciled, ReconcileError> {
        match message {
            StreamMessage::Update(readings) => Ok(Reconciled::Append(self.update(readings))),
            StreamMessage::Snapshot(entries) => self.snapshot(entries).map(Reconciled::Replace),
        }
    }

    fn update(&self, readings: Readings) -> Sample {
        Sample::new(self.clock.display_now(), readings)
    }

    fn snapshot(&self, entries: Vec<(String, Readings)>) -> Result<Vec<Sample>, ReconcileError> {
        let mut parsed = entries
            .into_iter()
            .map(|(key, readings)| parse_offset(&key).map(|offset| (offset, readings)))
            .collect::<Result<Vec<_>, _>>()?;

        let Some(max_offset) = parsed.iter().map(|(offset, _)| *offset).max() else {
            return Ok(Vec::new());
        };

        // stable, so equal offsets keep wire order and the last one survives
        parsed.sort_by_key(|(offset, _)| *offset);
        let mut points: Vec<(u64, Readings)> = Vec::with_capacity(parsed.len());
        for (offset, readings) in parsed {
            match points.last_mut() {
                Some(last) if last.0 == offset => {
                    tracing::debug!(offset, "duplicate snapshot offset, keeping the later entry");
                    last.1 = readings;
                }
                _ => points.push((offset, readings)),
            }
        }

        let anchor = self.clock.display_now();
        points
            .into_iter()
            .map(|(offset, readings)| {
                minutes_before(anchor, max_offset - offset)
                    .map(|timestamp| Sample::new(timestamp, readings))
                    .ok_or(ReconcileError::OffsetOutOfRange(offset))
            })
            .collect()
    }
}

/// plain decimal digits only; `u64::from_str` alone would also take "+5"
fn parse_offset(key: &str) -> Result<u64, ReconcileError> {
    let invalid = || ReconcileError::InvalidOffset(key.to_string());
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    key.parse::<u64>().map_err(|_| invalid())
}

fn minutes_before(anchor: i64, minutes: u64) -> Option<i64> {
    i64::try_from(minutes)
        .ok()?
        .checked_mul(MINUTE_MS)
        .and_then(|delta| anchor.checked_sub(delta))
}
