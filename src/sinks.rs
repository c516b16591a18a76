//! ==============================================================================
//! sinks.rs - render sinks
//! ==============================================================================
//!
//! purpose:
//! ```text
//!     the two places a fresh chart view goes:
//!     - `LogSink`: prints the newest sample, like a console readout
//!     - `WatchSink`: publishes the view on a tokio watch channel so the
//!       http server (or any other reader) always sees the latest one
//! ```
//!
//! relationships:
//! ```text
//!     - implements: dispatcher.rs (RenderSink)
//!     - read by: server.rs (watch::Receiver<DashboardState>)
//! ```
//!
//! ==============================================================================

use serde::Serialize;
use tokio::sync::watch;

use crate::buffer::SeriesView;
use crate::channels::Channel;
use crate::dispatcher::{ConnectionState, RenderSink};

// ==============================================================================
// log sink
// ==============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink {
    show_samples: bool,
}

impl LogSink {
    pub fn new(show_samples: bool) -> Self {
        Self { show_samples }
    }
}

fn fmt_reading(value: Option<f64>) -> String {
    value.map_or_else(|| "--".to_string(), |v| format!("{v:.1}"))
}

impl RenderSink for LogSink {
    fn render(&mut self, view: &SeriesView) {
        if !self.show_samples {
            return;
        }
        let Some(sample) = view.latest() else {
            tracing::info!("[CHART] history cleared");
            return;
        };
        let values = &sample.values;
        tracing::info!(
            "[CHART] {} pts | Pit: {}°F | Food: {}°F | Setpoint: {}°F | Blower: {}%",
            view.len(),
            fmt_reading(values.get(Channel::PitTemp)),
            fmt_reading(values.get(Channel::FoodTemp)),
            fmt_reading(values.get(Channel::Setpoint)),
            fmt_reading(values.get(Channel::BlowerSpeed)),
        );
    }

    fn connection_changed(&mut self, state: ConnectionState) {
        tracing::debug!(?state, "[CHART] connection state changed");
    }
}

// ==============================================================================
// watch sink
// ==============================================================================

/// everything a remote chart needs to redraw
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardState {
    pub connected: bool,
    pub series: SeriesView,
}

pub struct WatchSink {
    tx: watch::Sender<DashboardState>,
}

impl WatchSink {
    /// create the sink together with a receiver for readers
    pub fn channel() -> (Self, watch::Receiver<DashboardState>) {
        let (tx, rx) = watch::channel(DashboardState::default());
        (Self { tx }, rx)
    }
}

impl RenderSink for WatchSink {
    fn render(&mut self, view: &SeriesView) {
        // send_modify never fails, even with no receivers left
        self.tx.send_modify(|state| state.series = view.clone());
    }

    fn connection_changed(&mut self, state: ConnectionState) {
        let connected = state == ConnectionState::Connected;
        self.tx.send_modify(|s| s.connected = connected);
    }
}
