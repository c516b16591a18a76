//! ==============================================================================
//! decoder.rs - stream message decoder
//! ==============================================================================
//!
//! purpose:
//! ```text
//!     turns one raw websocket payload into a typed `StreamMessage`.
//!     decoding is pure: it never touches the buffer, and every value that
//!     reaches the buffer has been checked to be a number or an explicit gap.
//! ```
//!
//! wire shapes:
//! ```text
//!     update:   {"type": "update", "data": {"pit_temp": 230, ...}}
//!     snapshot: {"data": {"0": {"pit_temp": 225, ...}, "1": {...}}}
//!
//!     the snapshot producer historically sends no `type` at all, so an
//!     absent tag means snapshot unless `strict_tags` is set.
//!
//!     snapshot entries may also be the controller's positional stat record:
//!     [pit_temp, setpoint, blower_speed, [food_temp, ...]]
//! ```
//!
//! relationships:
//! ```text
//!     - used by: dispatcher.rs (first stage of the pipeline)
//!     - uses: channels.rs (wire name lookup)
//! ```
//!
//! ==============================================================================

use serde_json::{Map, Value};

use crate::channels::Channel;
use crate::domain::{Readings, StreamMessage};
use crate::error::DecodeError;

const UPDATE_TAG: &str = "update";
const SNAPSHOT_TAG: &str = "snapshot";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// require an explicit `type` of "update" or "snapshot" on every message
    pub strict_tags: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Snapshot,
    Update,
}

/// decode one text payload
pub fn decode(text: &str, options: DecodeOptions) -> Result<StreamMessage, DecodeError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Object(mut root) = value else {
        return Err(DecodeError::NotAnObject);
    };

    let kind = message_kind(root.get("type"), options)?;

    let data = match root.remove("data") {
        Some(Value::Object(data)) => data,
        Some(_) => return Err(DecodeError::DataNotAnObject),
        None => return Err(DecodeError::MissingData),
    };

    match kind {
        Kind::Update => Ok(StreamMessage::Update(decode_readings(&data)?)),
        Kind::Snapshot => decode_snapshot(data).map(StreamMessage::Snapshot),
    }
}

fn message_kind(tag: Option<&Value>, options: DecodeOptions) -> Result<Kind, DecodeError> {
    match tag {
        None if options.strict_tags => Err(DecodeError::MissingType),
        None => Ok(Kind::Snapshot),
        Some(Value::String(tag)) => match tag.as_str() {
            UPDATE_TAG => Ok(Kind::Update),
            SNAPSHOT_TAG => Ok(Kind::Snapshot),
            other if options.strict_tags => Err(DecodeError::UnknownType(other.to_string())),
            other => {
                tracing::debug!(tag = other, "treating unrecognised message type as snapshot");
                Ok(Kind::Snapshot)
            }
        },
        Some(_) => Err(DecodeError::InvalidType),
    }
}

fn decode_snapshot(data: Map<String, Value>) -> Result<Vec<(String, Readings)>, DecodeError> {
    let mut entries = Vec::with_capacity(data.len());
    for (key, entry) in data {
        let readings = match &entry {
            Value::Object(map) => decode_readings(map)?,
            Value::Array(items) => decode_stat_record(&key, items)?,
            _ => return Err(DecodeError::InvalidRecord { key }),
        };
        entries.push((key, readings));
    }
    Ok(entries)
}

fn decode_readings(map: &Map<String, Value>) -> Result<Readings, DecodeError> {
    let mut readings = Readings::new();
    for (name, value) in map {
        match Channel::from_name(name) {
            Some(channel) => readings.set(channel, decode_value(name, value)?),
            None => tracing::debug!(channel = %name, "ignoring unknown channel"),
        }
    }
    Ok(readings)
}

/// positional `[pit_temp, setpoint, blower_speed, food_temps]`
fn decode_stat_record(key: &str, items: &[Value]) -> Result<Readings, DecodeError> {
    let [pit, setpoint, blower, food] = items else {
        return Err(DecodeError::InvalidRecord { key: key.to_string() });
    };

    let mut readings = Readings::new();
    for (channel, value) in [
        (Channel::PitTemp, pit),
        (Channel::Setpoint, setpoint),
        (Channel::BlowerSpeed, blower),
        (Channel::FoodTemp, food),
    ] {
        readings.set(channel, decode_value(channel.name(), value)?);
    }
    Ok(readings)
}

/// number, null, or a list of probe readings of which the first is charted
fn decode_value(channel: &str, value: &Value) -> Result<Option<f64>, DecodeError> {
    let invalid = || DecodeError::InvalidValue { channel: channel.to_string() };

    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_f64().map(Some).ok_or_else(invalid),
        Value::Array(probes) => {
            if !probes.iter().all(|p| p.is_number() || p.is_null()) {
                return Err(invalid());
            }
            Ok(probes.first().and_then(Value::as_f64))
        }
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lenient(text: &str) -> Result<StreamMessage, DecodeError> {
        decode(text, DecodeOptions::default())
    }

    fn strict(text: &str) -> Result<StreamMessage, DecodeError> {
        decode(text, DecodeOptions { strict_tags: true })
    }

    #[test]
    fn decodes_update() {
        let msg = lenient(r#"{"type":"update","data":{"pit_temp":230,"setpoint":225.5}}"#).unwrap();
        let StreamMessage::Update(readings) = msg else {
            panic!("expected update, got {msg:?}");
        };
        assert_eq!(readings.get(Channel::PitTemp), Some(230.0));
        assert_eq!(readings.get(Channel::Setpoint), Some(225.5));
        assert_eq!(readings.get(Channel::FoodTemp), None);
    }

    #[test]
    fn untagged_message_is_snapshot() {
        let msg = lenient(r#"{"data":{"0":{"pit_temp":225,"food_temp":[140]}}}"#).unwrap();
        let StreamMessage::Snapshot(entries) = msg else {
            panic!("expected snapshot, got {msg:?}");
        };
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "0");
        assert_eq!(entries[0].1.get(Channel::FoodTemp), Some(140.0));
    }

    #[test]
    fn snapshot_keys_keep_wire_order() {
        let msg = lenient(r#"{"data":{"2":{},"0":{},"10":{},"1":{}}}"#).unwrap();
        let StreamMessage::Snapshot(entries) = msg else {
            panic!("expected snapshot");
        };
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["2", "0", "10", "1"]);
    }

    #[test]
    fn explicit_snapshot_tag() {
        let msg = strict(r#"{"type":"snapshot","data":{}}"#).unwrap();
        assert_eq!(msg, StreamMessage::Snapshot(Vec::new()));
    }

    #[test]
    fn strict_mode_rejects_missing_and_unknown_tags() {
        assert!(matches!(strict(r#"{"data":{}}"#), Err(DecodeError::MissingType)));
        assert!(matches!(
            strict(r#"{"type":"history","data":{}}"#),
            Err(DecodeError::UnknownType(t)) if t == "history"
        ));
    }

    #[test]
    fn lenient_mode_treats_unknown_tag_as_snapshot() {
        let msg = lenient(r#"{"type":"history","data":{"3":{"setpoint":200}}}"#).unwrap();
        assert!(matches!(msg, StreamMessage::Snapshot(ref e) if e.len() == 1));
    }

    #[test]
    fn non_string_tag_is_rejected() {
        assert!(matches!(lenient(r#"{"type":1,"data":{}}"#), Err(DecodeError::InvalidType)));
    }

    #[test]
    fn data_must_be_an_object() {
        assert!(matches!(
            lenient(r#"{"data": "not-an-object"}"#),
            Err(DecodeError::DataNotAnObject)
        ));
        assert!(matches!(lenient(r#"{"type":"update"}"#), Err(DecodeError::MissingData)));
    }

    #[test]
    fn malformed_payloads() {
        assert!(matches!(lenient("{not json"), Err(DecodeError::Json(_))));
        assert!(matches!(lenient("[1,2,3]"), Err(DecodeError::NotAnObject)));
    }

    #[test]
    fn non_numeric_value_is_rejected() {
        let err = lenient(r#"{"type":"update","data":{"pit_temp":"hot"}}"#).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidValue { ref channel } if channel == "pit_temp"));

        let err = lenient(r#"{"type":"update","data":{"food_temp":[140,"x"]}}"#).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidValue { .. }));
    }

    #[test]
    fn null_and_empty_probe_list_are_gaps() {
        let msg = lenient(r#"{"type":"update","data":{"pit_temp":null,"food_temp":[]}}"#).unwrap();
        assert_eq!(msg, StreamMessage::Update(Readings::new()));
    }

    #[test]
    fn unknown_channels_are_ignored() {
        let msg = lenient(r#"{"type":"update","data":{"humidity":40,"blower_speed":55}}"#).unwrap();
        assert_eq!(
            msg,
            StreamMessage::Update(Readings::new().with(Channel::BlowerSpeed, 55.0))
        );
    }

    #[test]
    fn legacy_food1_alias() {
        let msg = lenient(r#"{"type":"update","data":{"food1_temp":151}}"#).unwrap();
        assert_eq!(msg, StreamMessage::Update(Readings::new().with(Channel::FoodTemp, 151.0)));
    }

    #[test]
    fn positional_stat_record() {
        let msg = lenient(r#"{"data":{"0":[226.5,225,40,[141.0,139.0]]}}"#).unwrap();
        let expected = Readings::new()
            .with(Channel::PitTemp, 226.5)
            .with(Channel::Setpoint, 225.0)
            .with(Channel::BlowerSpeed, 40.0)
            .with(Channel::FoodTemp, 141.0);
        assert_eq!(msg, StreamMessage::Snapshot(vec![("0".to_string(), expected)]));
    }

    #[test]
    fn short_stat_record_is_rejected() {
        let err = lenient(r#"{"data":{"4":[226.5,225]}}"#).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidRecord { ref key } if key == "4"));
        let err = lenient(r#"{"data":{"4":12}}"#).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidRecord { .. }));
    }
}
