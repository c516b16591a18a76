//! live telemetry dashboard client for a pid-controlled smoker.
//!
//! the appliance streams readings over a websocket; this crate reconciles
//! the full-history snapshot and the incremental updates into one aligned,
//! multi-channel time series and hands each new view to a render sink.

pub mod buffer;
pub mod channels;
pub mod config;
pub mod decoder;
pub mod dispatcher;
pub mod domain;
pub mod error;
pub mod logging;
pub mod reconciler;
pub mod server;
pub mod sinks;

pub use buffer::{ChannelSeries, Point, SeriesView, TimeSeriesBuffer};
pub use channels::{Axis, Channel};
pub use decoder::{decode, DecodeOptions};
pub use dispatcher::{Applied, ConnectionState, Disconnect, DispatchStats, Dispatcher, RenderSink};
pub use domain::{Readings, Sample, StreamMessage};
pub use error::{DecodeError, DispatchError, ReconcileError};
pub use reconciler::{Clock, FixedClock, Reconciled, Reconciler, SystemClock};
