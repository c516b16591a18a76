use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::channels::Channel;

/// one reading per channel; `None` means the source did not report it
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Readings {
    values: [Option<f64>; Channel::COUNT],
}

impl Readings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, channel: Channel) -> Option<f64> {
        self.values[channel.index()]
    }

    pub fn set(&mut self, channel: Channel, value: Option<f64>) {
        self.values[channel.index()] = value;
    }

    /// builder-style setter, mostly for tests and fixtures
    pub fn with(mut self, channel: Channel, value: f64) -> Self {
        self.set(channel, Some(value));
        self
    }

    /// channels that carry a value, in registry order
    pub fn iter(&self) -> impl Iterator<Item = (Channel, f64)> + '_ {
        Channel::ALL
            .into_iter()
            .filter_map(move |c| self.get(c).map(|v| (c, v)))
    }
}

// serialized as a json object holding only the channels that have values
impl Serialize for Readings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (channel, value) in self.iter() {
            map.serialize_entry(channel.name(), &value)?;
        }
        map.end()
    }
}

/// one reading across all channels at a single instant
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Sample {
    /// display-adjusted milliseconds since the epoch
    pub timestamp: i64,
    pub values: Readings,
}

impl Sample {
    pub fn new(timestamp: i64, values: Readings) -> Self {
        Self { timestamp, values }
    }
}

/// a decoded stream message, tag decided once at decode time
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    /// full history keyed by minute offset text, in wire order
    Snapshot(Vec<(String, Readings)>),
    /// the single newest reading
    Update(Readings),
}
