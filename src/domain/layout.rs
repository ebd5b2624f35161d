use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};

/// Snap granularity for user-created boundaries.
pub const SNAP_MINUTES: i64 = 15;
/// Floor pixel height so heavily clipped events stay clickable.
pub const MIN_EVENT_HEIGHT_PX: f64 = 20.0;

/// Renderable placement of an event within the day window, as percentages of
/// the window span plus a fixed pixel floor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventBox {
    pub top_percent: f64,
    pub height_percent: f64,
    pub min_height_px: f64,
}

impl EventBox {
    pub fn top_css(&self) -> String {
        format!("{}%", self.top_percent)
    }

    pub fn height_css(&self) -> String {
        format!("{}%", self.height_percent)
    }

    pub fn min_height_css(&self) -> String {
        format!("{}px", self.min_height_px)
    }
}

/// Wall-clock minutes since midnight for a timestamp.
pub fn minutes_since_midnight(at: NaiveDateTime) -> i64 {
    i64::from(at.hour()) * 60 + i64::from(at.minute())
}

/// Place an event's start/end within the window starting at `base_hour`.
///
/// Offsets are computed unclamped first, then each bound is clamped to
/// `[0, span]` independently. An event lying fully outside the window on the
/// same date collapses to a zero-height sliver at the boundary; it is not
/// suppressed here. Callers filter events to the column's date beforehand.
pub fn event_box(
    start: NaiveDateTime,
    end: NaiveDateTime,
    base_hour: u32,
    span_minutes: u32,
) -> EventBox {
    let span = i64::from(span_minutes);
    let start_min = minutes_since_midnight(start) - i64::from(base_hour) * 60;
    let end_min = minutes_since_midnight(end) - i64::from(base_hour) * 60;
    let clamped_start = start_min.clamp(0, span);
    let clamped_end = end_min.clamp(0, span);

    EventBox {
        top_percent: clamped_start as f64 / span as f64 * 100.0,
        height_percent: (clamped_end - clamped_start) as f64 / span as f64 * 100.0,
        min_height_px: MIN_EVENT_HEIGHT_PX,
    }
}

/// Vertical position of the current-time indicator, clamped to the window.
pub fn now_offset_percent(now: NaiveDateTime, base_hour: u32, span_minutes: u32) -> f64 {
    let span = i64::from(span_minutes);
    let min = minutes_since_midnight(now) - i64::from(base_hour) * 60;
    min.clamp(0, span) as f64 / span as f64 * 100.0
}

/// Convert a vertical pixel offset inside the grid element to minutes since
/// window start, clamped to `[0, span]`. The container height is a read-only
/// snapshot measured by the host at interaction time.
pub fn pointer_to_minutes(offset_y: f64, container_height: f64, span_minutes: u32) -> f64 {
    if container_height <= 0.0 {
        return 0.0;
    }
    let minutes = offset_y / container_height * f64::from(span_minutes);
    minutes.clamp(0.0, f64::from(span_minutes))
}

/// Round a minute offset to the nearest quarter hour. Clamping happens before
/// snapping, so a snapped value can exceed the span by up to seven minutes;
/// selection paths re-clamp afterwards via [`snap_clamped`].
pub fn snap_quarter(minutes: f64) -> i64 {
    (minutes / SNAP_MINUTES as f64).round() as i64 * SNAP_MINUTES
}

/// Snap, then re-clamp to the window span.
pub fn snap_clamped(minutes: f64, span_minutes: u32) -> u32 {
    snap_quarter(minutes).clamp(0, i64::from(span_minutes)) as u32
}

/// Week-view column hit test: horizontal pixel offset to a day index in 0..=6.
pub fn day_column_at(offset_x: f64, grid_width: f64) -> usize {
    if grid_width <= 0.0 {
        return 0;
    }
    let column_width = grid_width / 7.0;
    ((offset_x / column_width).floor() as i64).clamp(0, 6) as usize
}

/// Convert minutes since window start back to a wall-clock timestamp on the
/// given day. The inverse of the pointer mapping, used when a completed
/// selection or drag is turned into a schedule.
pub fn window_minutes_to_datetime(day: NaiveDate, base_hour: u32, minutes: i64) -> NaiveDateTime {
    day.and_hms_opt(base_hour, 0, 0).expect("valid window start")
        + Duration::minutes(minutes)
}
