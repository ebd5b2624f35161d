use crate::domain::models::GridSettings;

/// The visible slice of a day, as an ordered sequence of clock hours.
///
/// The window always starts at the wake hour. Equal wake and sleep hours mean
/// the full 24-hour day; a sleep hour earlier than the wake hour means the
/// window runs past midnight (wake 22, sleep 6 covers 22:00 through 06:59).
/// Both endpoints are inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayWindow {
    hours: Vec<u32>,
}

impl DayWindow {
    pub fn new(wake_hour: u32, sleep_hour: u32) -> Self {
        let hours = if wake_hour == sleep_hour {
            (0..24).map(|offset| (wake_hour + offset) % 24).collect()
        } else if wake_hour < sleep_hour {
            (wake_hour..=sleep_hour).collect()
        } else {
            (wake_hour..24).chain(0..=sleep_hour).collect()
        };
        Self { hours }
    }

    pub fn from_settings(settings: &GridSettings) -> Self {
        Self::new(settings.wake_hour, settings.sleep_hour)
    }

    pub fn hours(&self) -> &[u32] {
        &self.hours
    }

    pub fn base_hour(&self) -> u32 {
        self.hours[0]
    }

    pub fn span_hours(&self) -> u32 {
        self.hours.len() as u32
    }

    /// Total minutes in the window, the denominator for all percent placement.
    pub fn span_minutes(&self) -> u32 {
        self.span_hours() * 60
    }
}

/// Hour label for the left-hand time column, e.g. `"7 AM"`, `"12 PM"`.
pub fn format_hour(hour: u32) -> String {
    let hour = hour % 24;
    let suffix = if hour < 12 { "AM" } else { "PM" };
    let display = match hour % 12 {
        0 => 12,
        other => other,
    };
    format!("{display} {suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn daytime_window_is_inclusive_of_both_ends() {
        let window = DayWindow::new(7, 23);
        assert_eq!(window.hours().first(), Some(&7));
        assert_eq!(window.hours().last(), Some(&23));
        assert_eq!(window.span_hours(), 17);
        assert_eq!(window.span_minutes(), 1020);
    }

    #[test]
    fn window_crossing_midnight_wraps_in_order() {
        let window = DayWindow::new(22, 6);
        assert_eq!(window.hours(), &[22, 23, 0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(window.span_hours(), 9);
    }

    #[test]
    fn equal_bounds_cover_the_full_day() {
        let window = DayWindow::new(5, 5);
        assert_eq!(window.span_hours(), 24);
        assert_eq!(window.base_hour(), 5);
        assert_eq!(window.hours()[23], 4);
    }

    #[test]
    fn format_hour_handles_noon_and_midnight() {
        assert_eq!(format_hour(0), "12 AM");
        assert_eq!(format_hour(7), "7 AM");
        assert_eq!(format_hour(12), "12 PM");
        assert_eq!(format_hour(23), "11 PM");
    }

    proptest! {
        #[test]
        fn equal_bounds_always_yield_24_distinct_hours(hour in 0u32..24) {
            let window = DayWindow::new(hour, hour);
            prop_assert_eq!(window.span_hours(), 24);
            prop_assert_eq!(window.base_hour(), hour);
            let mut sorted = window.hours().to_vec();
            sorted.sort_unstable();
            sorted.dedup();
            prop_assert_eq!(sorted.len(), 24);
        }

        #[test]
        fn forward_window_is_strictly_increasing(
            wake in 0u32..23,
            extra in 1u32..24
        ) {
            let sleep = (wake + extra).min(23);
            prop_assume!(wake < sleep);
            let window = DayWindow::new(wake, sleep);
            prop_assert_eq!(window.span_hours(), sleep - wake + 1);
            prop_assert!(window.hours().windows(2).all(|pair| pair[0] < pair[1]));
            prop_assert_eq!(window.base_hour(), wake);
        }

        #[test]
        fn wrapped_window_length_accounts_for_midnight(
            sleep in 0u32..23,
            extra in 1u32..24
        ) {
            let wake = (sleep + extra).min(23);
            prop_assume!(wake > sleep);
            let window = DayWindow::new(wake, sleep);
            prop_assert_eq!(window.span_hours(), (24 - wake) + sleep + 1);
            prop_assert_eq!(window.hours().last(), Some(&sleep));
        }
    }
}
