//! ==============================================================================
//! dispatcher.rs - stream consumer / dispatcher
//! ==============================================================================
//!
//! purpose:
//! ```text
//!     owns the /status connection and drives every inbound message through
//!     the pipeline:
//!
//!         text -> decoder -> reconciler -> buffer.{replace_all|append}
//!              -> sink.render(buffer.snapshot())
//! ```
//!
//! state machine:
//!
//! ```text
//!     ┌──────────────┐   connect / run   ┌───────────┐
//!     │ Disconnected │ ────────────────> │ Connected │
//!     └──────────────┘ <──────────────── └───────────┘
//!                        close / error / end of stream
//!
//!     while disconnected nothing is rendered. there is no reconnect here;
//!     the caller gets a `Disconnect` back and decides what to do.
//! ```
//!
//! failure policy:
//! ```text
//!     a bad message is logged and dropped. the buffer and sink are left
//!     untouched and the next message is processed normally.
//! ```
//!
//! concurrency:
//! ```text
//!     one task, one writer. a message is fully applied and rendered before
//!     the next one is pulled off the stream.
//! ```
//!
//! ==============================================================================

use anyhow::{Context, Result};
use futures_util::{Stream, StreamExt};
use std::fmt::Display;
use std::ops::ControlFlow;
use tokio_tungstenite::tungstenite::Message;

use crate::buffer::{SeriesView, TimeSeriesBuffer};
use crate::decoder::{self, DecodeOptions};
use crate::error::{DecodeError, DispatchError};
use crate::reconciler::{Clock, Reconciled, Reconciler, SystemClock};

// ==============================================================================
// render sink - the collaborator that draws
// ==============================================================================

/// receives a fresh view after every applied message
///
/// views are immutable snapshots; a sink should not expect an old view to
/// change and should use the newest one it was handed.
pub trait RenderSink {
    fn render(&mut self, view: &SeriesView);

    /// told about connect/disconnect transitions; does nothing by default
    fn connection_changed(&mut self, _state: ConnectionState) {}
}

impl<S: RenderSink + ?Sized> RenderSink for Box<S> {
    fn render(&mut self, view: &SeriesView) {
        (**self).render(view)
    }

    fn connection_changed(&mut self, state: ConnectionState) {
        (**self).connection_changed(state)
    }
}

impl<A: RenderSink, B: RenderSink> RenderSink for (A, B) {
    fn render(&mut self, view: &SeriesView) {
        self.0.render(view);
        self.1.render(view);
    }

    fn connection_changed(&mut self, state: ConnectionState) {
        self.0.connection_changed(state);
        self.1.connection_changed(state);
    }
}

// ==============================================================================
// state
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// why the stream stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disconnect {
    /// the server sent a close frame
    Closed { code: Option<u16>, reason: String },
    /// the transport failed
    TransportError(String),
    /// the stream ended without a close frame
    StreamEnded,
}

/// what a successfully applied message did to the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// snapshot installed with this many samples
    Replaced(usize),
    Appended,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub applied: u64,
    pub dropped: u64,
}

// ==============================================================================
// dispatcher
// ==============================================================================

pub struct Dispatcher<S, C = SystemClock> {
    state: ConnectionState,
    buffer: TimeSeriesBuffer,
    reconciler: Reconciler<C>,
    options: DecodeOptions,
    sink: S,
    stats: DispatchStats,
}

impl<S: RenderSink, C: Clock> Dispatcher<S, C> {
    pub fn new(sink: S, clock: C, options: DecodeOptions) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            buffer: TimeSeriesBuffer::new(),
            reconciler: Reconciler::new(clock),
            options,
            sink,
            stats: DispatchStats::default(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn buffer(&self) -> &TimeSeriesBuffer {
        &self.buffer
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn clock(&self) -> &C {
        self.reconciler.clock()
    }

    /// open the websocket and consume it until it closes
    ///
    /// only a failure to open the connection is an error; how the stream
    /// ended afterwards is reported as the `Disconnect` value.
    pub async fn connect(&mut self, url: &str) -> Result<Disconnect> {
        tracing::info!(%url, "connecting to telemetry stream");
        let (stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .with_context(|| format!("failed to connect to {url}"))?;
        Ok(self.run(stream).await)
    }

    /// consume an already-open stream of websocket frames
    pub async fn run<St, E>(&mut self, mut stream: St) -> Disconnect
    where
        St: Stream<Item = Result<Message, E>> + Unpin,
        E: Display,
    {
        self.on_open();
        while let Some(item) = stream.next().await {
            let frame = match item {
                Ok(frame) => frame,
                Err(e) => return self.on_close(Disconnect::TransportError(e.to_string())),
            };
            if let ControlFlow::Break(disconnect) = self.on_frame(frame) {
                return self.on_close(disconnect);
            }
        }
        self.on_close(Disconnect::StreamEnded)
    }

    pub fn on_open(&mut self) {
        tracing::info!("telemetry stream connected");
        self.set_state(ConnectionState::Connected);
    }

    pub fn on_close(&mut self, disconnect: Disconnect) -> Disconnect {
        tracing::info!(
            ?disconnect,
            applied = self.stats.applied,
            dropped = self.stats.dropped,
            "telemetry stream disconnected"
        );
        self.set_state(ConnectionState::Disconnected);
        disconnect
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state != state {
            self.state = state;
            self.sink.connection_changed(state);
        }
    }

    /// handle one raw frame; `Break` means the peer closed the connection
    pub fn on_frame(&mut self, frame: Message) -> ControlFlow<Disconnect> {
        match frame {
            Message::Text(text) => {
                self.on_text(&text);
            }
            Message::Binary(bytes) => match std::str::from_utf8(&bytes) {
                Ok(text) => {
                    self.on_text(text);
                }
                Err(_) => self.drop_message(DecodeError::NotUtf8.into()),
            },
            Message::Close(frame) => {
                let (code, reason) = frame
                    .map(|f| (Some(u16::from(f.code)), f.reason.to_string()))
                    .unwrap_or((None, String::new()));
                return ControlFlow::Break(Disconnect::Closed { code, reason });
            }
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
        }
        ControlFlow::Continue(())
    }

    /// apply one text message and render; `None` if it was dropped or the
    /// dispatcher is not connected
    pub fn on_text(&mut self, text: &str) -> Option<Applied> {
        if self.state != ConnectionState::Connected {
            tracing::debug!("ignoring message while disconnected");
            return None;
        }

        match self.apply(text) {
            Ok(applied) => {
                self.stats.applied += 1;
                tracing::trace!(?applied, samples = self.buffer.len(), "message applied");
                self.sink.render(&self.buffer.snapshot());
                Some(applied)
            }
            Err(e) => {
                self.drop_message(e);
                None
            }
        }
    }

    fn apply(&mut self, text: &str) -> Result<Applied, DispatchError> {
        let message = decoder::decode(text, self.options)?;
        let applied = match self.reconciler.reconcile(message)? {
            Reconciled::Replace(samples) => {
                self.buffer.replace_all(&samples);
                Applied::Replaced(samples.len())
            }
            Reconciled::Append(sample) => {
                self.buffer.append(&sample);
                Applied::Appended
            }
        };
        Ok(applied)
    }

    fn drop_message(&mut self, error: DispatchError) {
        self.stats.dropped += 1;
        tracing::warn!(%error, "dropping telemetry message");
    }
}
