use crate::domain::layout::{snap_clamped, SNAP_MINUTES};

/// Minimum rendered height for the live selection box, in percent of span.
const MIN_BOX_HEIGHT_PERCENT: f64 = 1.0;
/// Duration assigned on press so a plain click yields a visible block.
const DEFAULT_SELECTION_MINUTES: u32 = 60;

/// Normalized result of a completed drag, handed to the task-creation flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedRange {
    pub start_min: u32,
    pub end_min: u32,
    /// Week-view column the drag started in; `None` in day view.
    pub day_index: Option<usize>,
}

impl SelectedRange {
    pub fn duration_minutes(&self) -> u32 {
        self.end_min - self.start_min
    }
}

/// Live selection box placement, from the unnormalized in-flight range so the
/// box grows and shrinks with the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionBox {
    pub top_percent: f64,
    pub height_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SelectionPhase {
    Idle,
    Selecting {
        start_min: u32,
        end_min: u32,
        day_index: Option<usize>,
    },
}

/// Pointer-driven time-range selection: idle until press, tracking the
/// pointer until release or cancel. At most one selection is in flight; a
/// new press replaces whatever was active. The day column travels inside the
/// machine rather than through any shared ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSelection {
    phase: SelectionPhase,
}

impl Default for DragSelection {
    fn default() -> Self {
        Self {
            phase: SelectionPhase::Idle,
        }
    }
}

impl DragSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_selecting(&self) -> bool {
        matches!(self.phase, SelectionPhase::Selecting { .. })
    }

    /// Pointer press at a raw minute offset (already clamped to the span by
    /// the pointer mapping). Snaps the start and seeds a one-hour range.
    pub fn press(&mut self, raw_minutes: f64, span_minutes: u32, day_index: Option<usize>) {
        let start = snap_clamped(raw_minutes, span_minutes);
        self.phase = SelectionPhase::Selecting {
            start_min: start,
            end_min: start + DEFAULT_SELECTION_MINUTES,
            day_index,
        };
    }

    /// Pointer move: re-snap the trailing edge only. Dragging upward is
    /// allowed to produce an end before the start; ordering is applied on
    /// release. No-op while idle.
    pub fn update(&mut self, raw_minutes: f64, span_minutes: u32) {
        if let SelectionPhase::Selecting { end_min, .. } = &mut self.phase {
            *end_min = snap_clamped(raw_minutes, span_minutes);
        }
    }

    /// Pointer release: normalize to an ordered range with at least a
    /// 15-minute duration, clear the machine, and emit the result. Returns
    /// `None` when no selection was in flight.
    pub fn release(&mut self) -> Option<SelectedRange> {
        let SelectionPhase::Selecting {
            start_min,
            end_min,
            day_index,
        } = self.phase
        else {
            return None;
        };
        self.phase = SelectionPhase::Idle;

        let start = start_min.min(end_min);
        let end = start_min.max(end_min).max(start + SNAP_MINUTES as u32);
        Some(SelectedRange {
            start_min: start,
            end_min: end,
            day_index,
        })
    }

    /// Pointer left the grid mid-drag: abort without emitting a range.
    pub fn cancel(&mut self) {
        self.phase = SelectionPhase::Idle;
    }

    /// Column the in-flight selection started in, if any.
    pub fn day_index(&self) -> Option<usize> {
        match self.phase {
            SelectionPhase::Selecting { day_index, .. } => day_index,
            SelectionPhase::Idle => None,
        }
    }

    /// Live selection box from the unnormalized range, with a 1% floor so a
    /// fresh click is immediately visible.
    pub fn selection_box(&self, span_minutes: u32) -> Option<SelectionBox> {
        let SelectionPhase::Selecting {
            start_min, end_min, ..
        } = self.phase
        else {
            return None;
        };
        let span = f64::from(span_minutes);
        let top = f64::from(start_min.min(end_min)) / span * 100.0;
        let height = f64::from(start_min.abs_diff(end_min)) / span * 100.0;
        Some(SelectionBox {
            top_percent: top,
            height_percent: height.max(MIN_BOX_HEIGHT_PERCENT),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    Move,
    Resize,
}

/// Resulting placement of a moved or resized block, in minutes since window
/// start. The caller converts it to timestamps for the day at `day_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventPlacement {
    pub event_id: u64,
    pub start_min: u32,
    pub end_min: u32,
    pub day_index: usize,
}

/// Drag of an existing block: moving preserves its duration, resizing pins
/// the start and drags the end. Both enforce a 15-minute floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventDrag {
    event_id: u64,
    mode: DragMode,
    origin_min: u32,
    duration_min: u32,
}

impl EventDrag {
    pub fn begin_move(event_id: u64, origin_min: u32, duration_min: u32) -> Self {
        Self {
            event_id,
            mode: DragMode::Move,
            origin_min,
            duration_min: duration_min.max(SNAP_MINUTES as u32),
        }
    }

    pub fn begin_resize(event_id: u64, origin_min: u32) -> Self {
        Self {
            event_id,
            mode: DragMode::Resize,
            origin_min,
            duration_min: 0,
        }
    }

    pub fn mode(&self) -> DragMode {
        self.mode
    }

    pub fn event_id(&self) -> u64 {
        self.event_id
    }

    /// Placement for the current pointer position; also used for the live
    /// preview while the drag is in progress.
    pub fn placement_at(
        &self,
        raw_minutes: f64,
        span_minutes: u32,
        day_index: usize,
    ) -> EventPlacement {
        let snapped = snap_clamped(raw_minutes, span_minutes);
        match self.mode {
            DragMode::Move => EventPlacement {
                event_id: self.event_id,
                start_min: snapped,
                end_min: snapped + self.duration_min,
                day_index,
            },
            DragMode::Resize => {
                let end = snapped.max(self.origin_min + SNAP_MINUTES as u32);
                EventPlacement {
                    event_id: self.event_id,
                    start_min: self.origin_min,
                    end_min: end,
                    day_index,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn click_without_move_produces_a_one_hour_range() {
        let mut selection = DragSelection::new();
        selection.press(127.0, 1020, None);
        let range = selection.release().expect("completed selection");
        assert_eq!(range.start_min, 120);
        assert_eq!(range.end_min, 180);
        assert!(!selection.is_selecting());
    }

    #[test]
    fn upward_drag_is_normalized_on_release() {
        let mut selection = DragSelection::new();
        selection.press(600.0, 1020, Some(2));
        selection.update(450.0, 1020);
        let range = selection.release().expect("completed selection");
        assert_eq!(range.start_min, 450);
        assert_eq!(range.end_min, 600);
        assert_eq!(range.day_index, Some(2));
    }

    #[test]
    fn dragging_back_to_the_start_keeps_a_quarter_hour() {
        let mut selection = DragSelection::new();
        selection.press(300.0, 1020, None);
        selection.update(300.0, 1020);
        let range = selection.release().expect("completed selection");
        assert_eq!(range.duration_minutes(), 15);
    }

    #[test]
    fn cancel_discards_the_selection_silently() {
        let mut selection = DragSelection::new();
        selection.press(300.0, 1020, None);
        selection.cancel();
        assert!(selection.release().is_none());
    }

    #[test]
    fn release_while_idle_yields_nothing() {
        let mut selection = DragSelection::new();
        assert!(selection.release().is_none());
    }

    #[test]
    fn new_press_replaces_the_selection_in_flight() {
        let mut selection = DragSelection::new();
        selection.press(120.0, 1020, Some(1));
        selection.press(480.0, 1020, Some(4));
        let range = selection.release().expect("completed selection");
        assert_eq!(range.start_min, 480);
        assert_eq!(range.day_index, Some(4));
    }

    #[test]
    fn selection_box_follows_the_unnormalized_range() {
        let mut selection = DragSelection::new();
        selection.press(600.0, 1020, None);
        selection.update(450.0, 1020);
        let boxed = selection.selection_box(1020).expect("live box");
        assert!((boxed.top_percent - 450.0 / 1020.0 * 100.0).abs() < 1e-9);
        assert!((boxed.height_percent - 150.0 / 1020.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn selection_box_enforces_a_visible_floor() {
        let mut selection = DragSelection::new();
        selection.press(300.0, 1020, None);
        selection.update(300.0, 1020);
        let boxed = selection.selection_box(1020).expect("live box");
        assert_eq!(boxed.height_percent, 1.0);
    }

    #[test]
    fn snapped_press_near_span_end_stays_inside_the_window() {
        let mut selection = DragSelection::new();
        selection.press(1019.0, 1020, None);
        selection.update(1013.0, 1020);
        let range = selection.release().expect("completed selection");
        assert!(range.end_min <= 1020 + 60);
        assert_eq!(range.start_min.min(range.end_min) % 15, 0);
    }

    #[test]
    fn moving_a_block_preserves_its_duration() {
        let drag = EventDrag::begin_move(7, 180, 90);
        let placed = drag.placement_at(307.0, 1020, 3);
        assert_eq!(placed.start_min, 300);
        assert_eq!(placed.end_min, 390);
        assert_eq!(placed.day_index, 3);
        assert_eq!(placed.event_id, 7);
    }

    #[test]
    fn resizing_never_collapses_below_a_quarter_hour() {
        let drag = EventDrag::begin_resize(7, 180);
        let placed = drag.placement_at(100.0, 1020, 0);
        assert_eq!(placed.start_min, 180);
        assert_eq!(placed.end_min, 195);

        let extended = drag.placement_at(367.0, 1020, 0);
        assert_eq!(extended.end_min, 360);
    }

    proptest! {
        #[test]
        fn released_ranges_are_ordered_with_minimum_duration(
            press in 0.0f64..1020.0,
            moves in proptest::collection::vec(0.0f64..1020.0, 0..8)
        ) {
            let mut selection = DragSelection::new();
            selection.press(press, 1020, Some(0));
            for position in moves {
                selection.update(position, 1020);
            }
            let range = selection.release().expect("completed selection");
            prop_assert!(range.start_min <= range.end_min);
            prop_assert!(range.duration_minutes() >= 15);
            prop_assert_eq!(range.start_min % 15, 0);
            prop_assert_eq!(range.end_min % 15, 0);
        }
    }
}
