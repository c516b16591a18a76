//! ==============================================================================
//! error.rs - per-message failure taxonomy
//! ==============================================================================
//!
//! none of these are fatal. the dispatcher logs them and drops the message;
//! the chart may fall slightly behind but the stream keeps running.
//!
//! ==============================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("binary frame is not valid utf-8")]
    NotUtf8,

    #[error("message is not a json object")]
    NotAnObject,

    #[error("message has no `data` field")]
    MissingData,

    #[error("message has no `type` field")]
    MissingType,

    #[error("`type` field is not a string")]
    InvalidType,

    #[error("unknown message type `{0}`")]
    UnknownType(String),

    #[error("`data` field is not an object")]
    DataNotAnObject,

    #[error("snapshot entry `{key}` is neither an object nor a stat record")]
    InvalidRecord { key: String },

    #[error("value for `{channel}` is not numeric or null")]
    InvalidValue { channel: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("snapshot key `{0}` is not a non-negative minute offset")]
    InvalidOffset(String),

    #[error("snapshot offset {0} minutes is outside the representable time range")]
    OffsetOutOfRange(u64),
}

/// why a single stream message was dropped
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}
