//! ==============================================================================
//! channels.rs - channel registry
//! ==============================================================================
//!
//! purpose:
//! ```text
//!     the fixed set of numeric quantities the dashboard charts. the set is
//!     known at compile time; nothing creates or destroys channels at runtime.
//! ```
//!
//! relationships:
//! ```text
//!     - used by: decoder.rs (maps wire names to channels)
//!     - used by: buffer.rs (one sequence per channel)
//!     - used by: server.rs (labels and axis placement for the chart)
//! ```
//!
//! ==============================================================================

use serde::Serialize;
use std::fmt;

/// which y-axis a channel is plotted against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// temperatures, degrees fahrenheit (0-350)
    Left,
    /// percentages (0-100)
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    PitTemp,
    FoodTemp,
    Setpoint,
    BlowerSpeed,
}

impl Channel {
    /// every channel, in chart legend order
    pub const ALL: [Channel; 4] = [
        Channel::PitTemp,
        Channel::FoodTemp,
        Channel::Setpoint,
        Channel::BlowerSpeed,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// name used on the wire
    pub fn name(self) -> &'static str {
        match self {
            Channel::PitTemp => "pit_temp",
            Channel::FoodTemp => "food_temp",
            Channel::Setpoint => "setpoint",
            Channel::BlowerSpeed => "blower_speed",
        }
    }

    /// human readable legend label
    pub fn label(self) -> &'static str {
        match self {
            Channel::PitTemp => "Pit Temp",
            Channel::FoodTemp => "Food Temp",
            Channel::Setpoint => "Setpoint Temp",
            Channel::BlowerSpeed => "Blower Speed",
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            Channel::BlowerSpeed => Axis::Right,
            _ => Axis::Left,
        }
    }

    /// position in `ALL`, used as a dense index by the buffer
    pub fn index(self) -> usize {
        self as usize
    }

    /// resolve a wire name, accepting the legacy single-probe alias
    pub fn from_name(name: &str) -> Option<Channel> {
        match name {
            "pit_temp" => Some(Channel::PitTemp),
            "food_temp" | "food1_temp" => Some(Channel::FoodTemp),
            "setpoint" => Some(Channel::Setpoint),
            "blower_speed" => Some(Channel::BlowerSpeed),
            _ => None,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
