use smokedash::reconciler::MINUTE_MS;
use smokedash::{
    Applied, Channel, ConnectionState, DecodeOptions, Dispatcher, FixedClock, RenderSink,
    SeriesView,
};

// ============================================================================
// Harness
// ============================================================================

const NOW_UTC: i64 = 1_700_000_000_000;
// UTC-5
const TZ_OFFSET: i64 = -300 * MINUTE_MS;
const DISPLAY_NOW: i64 = NOW_UTC + TZ_OFFSET;

#[derive(Default)]
struct Recorder {
    views: Vec<SeriesView>,
}

impl RenderSink for Recorder {
    fn render(&mut self, view: &SeriesView) {
        self.views.push(view.clone());
    }
}

fn connected() -> Dispatcher<Recorder, FixedClock> {
    let mut d = Dispatcher::new(
        Recorder::default(),
        FixedClock::new(NOW_UTC, TZ_OFFSET),
        DecodeOptions::default(),
    );
    d.on_open();
    assert_eq!(d.state(), ConnectionState::Connected);
    d
}

fn timestamps(view: &SeriesView, channel: Channel) -> Vec<i64> {
    view.points(channel).iter().map(|p| p.timestamp).collect()
}

fn values(view: &SeriesView, channel: Channel) -> Vec<Option<f64>> {
    view.points(channel).iter().map(|p| p.value).collect()
}

fn last_view(d: &Dispatcher<Recorder, FixedClock>) -> &SeriesView {
    d.sink().views.last().expect("nothing rendered")
}

// ============================================================================
// Worked examples
// ============================================================================

#[test]
fn test_single_key_snapshot_lands_at_now() {
    let mut d = connected();
    let applied = d.on_text(
        r#"{"data": {"0": {"pit_temp": 225, "food_temp": [140], "setpoint": 225, "blower_speed": 40}}}"#,
    );
    assert_eq!(applied, Some(Applied::Replaced(1)));

    let view = last_view(&d);
    for channel in Channel::ALL {
        assert_eq!(timestamps(view, channel), [DISPLAY_NOW]);
    }
    assert_eq!(values(view, Channel::PitTemp), [Some(225.0)]);
    assert_eq!(values(view, Channel::FoodTemp), [Some(140.0)]);
    assert_eq!(values(view, Channel::Setpoint), [Some(225.0)]);
    assert_eq!(values(view, Channel::BlowerSpeed), [Some(40.0)]);
}

#[test]
fn test_zero_key_is_five_minutes_before_five_key() {
    let mut d = connected();
    d.on_text(r#"{"data": {"5": {"pit_temp": 250}, "0": {"pit_temp": 200}}}"#);

    let view = last_view(&d);
    assert_eq!(
        timestamps(view, Channel::PitTemp),
        [DISPLAY_NOW - 5 * MINUTE_MS, DISPLAY_NOW]
    );
    assert_eq!(values(view, Channel::PitTemp), [Some(200.0), Some(250.0)]);
}

#[test]
fn test_update_without_food_temp_is_a_gap() {
    let mut d = connected();
    let applied = d.on_text(r#"{"type":"update","data":{"pit_temp":230}}"#);
    assert_eq!(applied, Some(Applied::Appended));

    let view = last_view(&d);
    assert_eq!(values(view, Channel::PitTemp), [Some(230.0)]);
    assert_eq!(values(view, Channel::FoodTemp), [None]);
}

#[test]
fn test_malformed_message_is_dropped_silently() {
    let mut d = connected();
    d.on_text(r#"{"data": {"0": {"pit_temp": 225}}}"#);
    let before = d.buffer().snapshot();
    let renders = d.sink().views.len();

    assert_eq!(d.on_text(r#"{"data": "not-an-object"}"#), None);

    assert_eq!(d.buffer().snapshot(), before);
    assert_eq!(d.sink().views.len(), renders);
    assert_eq!(d.stats().dropped, 1);
    assert_eq!(d.state(), ConnectionState::Connected);
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_updates_grow_every_channel_by_one() {
    let mut d = connected();
    d.on_text(r#"{"data": {"0": {"pit_temp": 225}, "1": {"pit_temp": 226}}}"#);

    for (i, pit) in [230, 231, 232].into_iter().enumerate() {
        d.clock().advance(10_000);
        let before = d.buffer().len();
        d.on_text(&format!(r#"{{"type":"update","data":{{"pit_temp":{pit}}}}}"#));
        let view = last_view(&d);
        for channel in Channel::ALL {
            assert_eq!(view.points(channel).len(), before + 1);
        }
        let newest = *timestamps(view, Channel::Setpoint).last().unwrap();
        let expected = DISPLAY_NOW + 10_000 * (i as i64 + 1);
        assert!((newest - expected).abs() <= 1_000);
    }
}

#[test]
fn test_snapshot_order_ignores_key_text_order() {
    let mut d = connected();
    d.on_text(r#"{"data": {"2": {"setpoint": 2}, "0": {"setpoint": 0}, "1": {"setpoint": 1}}}"#);

    let view = last_view(&d);
    assert_eq!(view.len(), 3);
    assert_eq!(values(view, Channel::Setpoint), [Some(0.0), Some(1.0), Some(2.0)]);
    let ts = timestamps(view, Channel::Setpoint);
    assert!(ts.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_repeated_snapshot_is_idempotent() {
    let snapshot = r#"{"data": {"3": {"pit_temp": 210}, "7": {"pit_temp": 215, "blower_speed": 60}}}"#;
    let mut d = connected();

    d.on_text(snapshot);
    let first = d.buffer().snapshot();
    d.on_text(snapshot);
    let second = d.buffer().snapshot();

    assert_eq!(first, second);
    assert_eq!(second.len(), 2);
}

#[test]
fn test_snapshot_replaces_accumulated_updates() {
    let mut d = connected();
    d.on_text(r#"{"type":"update","data":{"pit_temp":1}}"#);
    d.on_text(r#"{"type":"update","data":{"pit_temp":2}}"#);
    d.on_text(r#"{"data": {"0": {"pit_temp": 3}}}"#);
    assert_eq!(values(last_view(&d), Channel::PitTemp), [Some(3.0)]);
}

#[test]
fn test_empty_snapshot_resets_the_buffer() {
    let mut d = connected();
    d.on_text(r#"{"data": {"0": {"pit_temp": 225}}}"#);
    assert_eq!(d.on_text(r#"{"data": {}}"#), Some(Applied::Replaced(0)));
    assert!(d.buffer().is_empty());
    assert!(last_view(&d).is_empty());
}

#[test]
fn test_bad_offset_key_leaves_buffer_alone() {
    let mut d = connected();
    d.on_text(r#"{"data": {"0": {"pit_temp": 225}}}"#);
    assert_eq!(d.on_text(r#"{"data": {"0": {}, "soon": {}}}"#), None);
    assert_eq!(d.buffer().len(), 1);
    assert_eq!(d.stats().applied, 1);
}

#[test]
fn test_earlier_views_are_not_mutated() {
    let mut d = connected();
    d.on_text(r#"{"data": {"0": {"pit_temp": 225}}}"#);
    d.on_text(r#"{"type":"update","data":{"pit_temp":230}}"#);
    d.on_text(r#"{"data": {}}"#);

    let lens: Vec<usize> = d.sink().views.iter().map(SeriesView::len).collect();
    assert_eq!(lens, [1, 2, 0]);
}

#[test]
fn test_closed_dispatcher_stops_rendering() {
    let mut d = connected();
    d.on_text(r#"{"type":"update","data":{"pit_temp":230}}"#);
    d.on_close(smokedash::Disconnect::StreamEnded);

    assert_eq!(d.on_text(r#"{"type":"update","data":{"pit_temp":231}}"#), None);
    assert_eq!(d.buffer().len(), 1);
    assert_eq!(d.sink().views.len(), 1);
}
