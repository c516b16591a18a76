//! ==============================================================================
//! buffer.rs - time-series buffer
//! ==============================================================================
//!
//! purpose:
//! ```text
//!     the accumulated chart data: one ordered sequence per channel.
//! ```
//!
//! invariants:
//! ```text
//!     - every channel has exactly as many points as there are timestamps,
//!       and index i of every channel belongs to the same sample. this holds
//!       by construction: timestamps are stored once and channel columns are
//!       only ever grown or replaced together.
//!     - only `replace_all` and `append` mutate the buffer.
//!     - a missing reading stays `None` so the chart draws a gap.
//! ```
//!
//! relationships:
//! ```text
//!     - written by: dispatcher.rs (single writer)
//!     - read by: render sinks, through immutable `SeriesView`s
//! ```
//!
//! ==============================================================================

use serde::ser::{Serialize, SerializeTuple, Serializer};
use std::sync::Arc;

use crate::channels::{Axis, Channel};
use crate::domain::{Readings, Sample};

/// one chart point; serialized as `[timestamp, value]` with `null` for gaps
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub timestamp: i64,
    pub value: Option<f64>,
}

impl Serialize for Point {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.timestamp)?;
        tuple.serialize_element(&self.value)?;
        tuple.end()
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ChannelSeries {
    pub channel: Channel,
    pub label: &'static str,
    pub axis: Axis,
    pub points: Arc<[Point]>,
}

/// immutable point-in-time copy of the buffer, cheap to clone and share
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct SeriesView {
    series: Arc<[ChannelSeries]>,
}

impl SeriesView {
    pub fn channels(&self) -> &[ChannelSeries] {
        &self.series
    }

    pub fn points(&self, channel: Channel) -> &[Point] {
        &self.series[channel.index()].points
    }

    /// number of samples (identical for every channel)
    pub fn len(&self) -> usize {
        self.series.first().map_or(0, |s| s.points.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// newest sample, read back from the last index of every channel
    pub fn latest(&self) -> Option<Sample> {
        let i = self.len().checked_sub(1)?;
        let mut values = Readings::new();
        for channel in Channel::ALL {
            values.set(channel, self.points(channel)[i].value);
        }
        Some(Sample::new(self.points(Channel::PitTemp)[i].timestamp, values))
    }
}

impl Default for SeriesView {
    fn default() -> Self {
        TimeSeriesBuffer::new().snapshot()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TimeSeriesBuffer {
    timestamps: Vec<i64>,
    columns: [Vec<Option<f64>>; Channel::COUNT],
}

impl TimeSeriesBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// discard everything and install `samples` verbatim
    ///
    /// samples are expected in ascending time order, as the reconciler
    /// produces them.
    pub fn replace_all(&mut self, samples: &[Sample]) {
        self.timestamps.clear();
        for column in &mut self.columns {
            column.clear();
        }
        self.timestamps.reserve(samples.len());
        for sample in samples {
            self.push(sample);
        }
    }

    /// add one sample at the end of every channel
    ///
    /// no ordering check: an out-of-order update lands at the end, which
    /// keeps channels aligned and is tolerated by the chart.
    pub fn append(&mut self, sample: &Sample) {
        self.push(sample);
    }

    fn push(&mut self, sample: &Sample) {
        self.timestamps.push(sample.timestamp);
        for channel in Channel::ALL {
            self.columns[channel.index()].push(sample.values.get(channel));
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// copy the current content into an immutable view
    pub fn snapshot(&self) -> SeriesView {
        let series = Channel::ALL
            .into_iter()
            .map(|channel| ChannelSeries {
                channel,
                label: channel.label(),
                axis: channel.axis(),
                points: self
                    .timestamps
                    .iter()
                    .zip(&self.columns[channel.index()])
                    .map(|(&timestamp, &value)| Point { timestamp, value })
                    .collect(),
            })
            .collect();
        SeriesView { series }
    }
}
