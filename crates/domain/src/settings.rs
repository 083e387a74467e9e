use crate::notification::{NotificationKind, Priority};
use crate::shared::entity::ID;
use chrono::prelude::*;
use chrono_tz::{Tz, UTC};
use serde::{Deserialize, Serialize};

/// A time-of-day window during which non-urgent notifications are
/// deferred. The window may wrap past midnight (`start > end`) and may
/// be restricted to a set of weekdays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuietHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
    /// Weekdays the window applies to, 0 = Monday .. 6 = Sunday.
    pub weekdays: Vec<u32>,
}

impl QuietHours {
    pub fn every_day(start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            start,
            end,
            weekdays: (0..7).collect(),
        }
    }

    /// Whether `time` falls inside the `[start, end)` window,
    /// accounting for overnight wraparound.
    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.start == self.end {
            // Empty window
            return false;
        }
        if self.start < self.end {
            self.start <= time && time < self.end
        } else {
            time >= self.start || time < self.end
        }
    }

    fn applies_on(&self, weekday: Weekday) -> bool {
        self.weekdays.contains(&weekday.num_days_from_monday())
    }

    /// Defers `t` out of the quiet window. Returns the possibly moved
    /// time and whether an adjustment happened. The result is never
    /// earlier than `t`:
    /// - outside the window (or on a non-applicable weekday): `t` unchanged
    /// - inside the window: `end` on the same calendar day, or on the
    ///   next day when the window wraps past midnight and `end` lies
    ///   numerically at or before `t`'s time of day
    pub fn adjust(&self, t: DateTime<Tz>) -> (DateTime<Tz>, bool) {
        if !self.applies_on(t.weekday()) {
            return (t, false);
        }
        let time_of_day = t.time();
        if !self.contains(time_of_day) {
            return (t, false);
        }

        let same_day_end = match t.date().and_time(self.end) {
            Some(end) => end,
            // Nonexistent local time (DST gap), leave the candidate alone
            None => return (t, false),
        };
        let adjusted = if self.end <= time_of_day {
            same_day_end + chrono::Duration::days(1)
        } else {
            same_day_end
        };
        (adjusted, true)
    }
}

/// Per-kind opt-outs. Everything defaults to enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindToggles {
    pub preparation: bool,
    pub departure: bool,
    pub move_between_stops: bool,
    pub urgent_change: bool,
}

impl Default for KindToggles {
    fn default() -> Self {
        Self {
            preparation: true,
            departure: true,
            move_between_stops: true,
            urgent_change: true,
        }
    }
}

impl KindToggles {
    pub fn enabled_for(&self, kind: NotificationKind) -> bool {
        match kind {
            NotificationKind::Preparation => self.preparation,
            NotificationKind::Departure => self.departure,
            NotificationKind::Move => self.move_between_stops,
            NotificationKind::UrgentChange => self.urgent_change,
        }
    }
}

/// How far ahead of a course milestone each notification fires.
/// An unset offset disables the corresponding notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingOffsets {
    /// Hour of day (0-23) for the preparation reminder on the day
    /// before the course
    pub day_before_hour: Option<u32>,
    /// Minutes before the computed departure moment
    pub departure_lead_min: Option<i64>,
    /// Minutes before the move between stops
    pub move_lead_min: Option<i64>,
}

impl Default for TimingOffsets {
    fn default() -> Self {
        Self {
            day_before_hour: Some(20),
            departure_lead_min: Some(30),
            move_lead_min: Some(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserNotificationSettings {
    pub user_id: ID,
    pub enabled: bool,
    pub timezone: Tz,
    pub quiet_hours: Option<QuietHours>,
    pub kinds: KindToggles,
    pub offsets: TimingOffsets,
    pub personalization_enabled: bool,
    pub max_per_day: usize,
    pub max_per_week: usize,
}

impl UserNotificationSettings {
    pub fn new(user_id: ID) -> Self {
        Self {
            user_id,
            enabled: true,
            timezone: UTC,
            quiet_hours: None,
            kinds: Default::default(),
            offsets: Default::default(),
            personalization_enabled: true,
            max_per_day: 3,
            max_per_week: 10,
        }
    }

    /// Applies the quiet-hours deferral of a delivery candidate.
    /// Urgent notifications are exempt.
    pub fn adjust_for_quiet_hours(
        &self,
        scheduled_at: i64,
        priority: Priority,
    ) -> (i64, bool) {
        if priority == Priority::Urgent {
            return (scheduled_at, false);
        }
        let window = match &self.quiet_hours {
            Some(window) => window,
            None => return (scheduled_at, false),
        };
        let local = self.timezone.timestamp_millis(scheduled_at);
        let (adjusted, moved) = window.adjust(local);
        (adjusted.timestamp_millis(), moved)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn overnight_window() -> QuietHours {
        QuietHours::every_day(
            NaiveTime::from_hms(22, 0, 0),
            NaiveTime::from_hms(8, 0, 0),
        )
    }

    fn settings_with(window: QuietHours) -> UserNotificationSettings {
        let mut settings = UserNotificationSettings::new(ID::new());
        settings.quiet_hours = Some(window);
        settings
    }

    fn utc_millis(y: i32, m: u32, d: u32, h: u32, min: u32) -> i64 {
        Utc.ymd(y, m, d).and_hms(h, min, 0).timestamp_millis()
    }

    #[test]
    fn defers_late_evening_to_next_morning() {
        let settings = settings_with(overnight_window());
        // Tuesday 23:30
        let t = utc_millis(2021, 6, 1, 23, 30);
        let (adjusted, moved) = settings.adjust_for_quiet_hours(t, Priority::Normal);
        assert!(moved);
        // Wednesday 08:00
        assert_eq!(adjusted, utc_millis(2021, 6, 2, 8, 0));
    }

    #[test]
    fn defers_early_morning_to_same_morning() {
        let settings = settings_with(overnight_window());
        let t = utc_millis(2021, 6, 2, 1, 0);
        let (adjusted, moved) = settings.adjust_for_quiet_hours(t, Priority::Normal);
        assert!(moved);
        assert_eq!(adjusted, utc_millis(2021, 6, 2, 8, 0));
    }

    #[test]
    fn leaves_daytime_untouched() {
        let settings = settings_with(overnight_window());
        let t = utc_millis(2021, 6, 1, 14, 0);
        assert_eq!(
            settings.adjust_for_quiet_hours(t, Priority::Normal),
            (t, false)
        );
    }

    #[test]
    fn window_end_is_exclusive_of_the_window() {
        let window = overnight_window();
        assert!(window.contains(NaiveTime::from_hms(22, 0, 0)));
        assert!(window.contains(NaiveTime::from_hms(7, 59, 59)));
        assert!(!window.contains(NaiveTime::from_hms(8, 0, 0)));
        assert!(!window.contains(NaiveTime::from_hms(21, 59, 59)));
    }

    #[test]
    fn non_wrapping_window_defers_within_the_day() {
        let window = QuietHours::every_day(
            NaiveTime::from_hms(12, 0, 0),
            NaiveTime::from_hms(14, 0, 0),
        );
        let settings = settings_with(window);
        let t = utc_millis(2021, 6, 1, 13, 0);
        let (adjusted, moved) = settings.adjust_for_quiet_hours(t, Priority::Normal);
        assert!(moved);
        assert_eq!(adjusted, utc_millis(2021, 6, 1, 14, 0));
    }

    #[test]
    fn urgent_bypasses_quiet_hours() {
        let settings = settings_with(overnight_window());
        let t = utc_millis(2021, 6, 1, 23, 30);
        assert_eq!(
            settings.adjust_for_quiet_hours(t, Priority::Urgent),
            (t, false)
        );
    }

    #[test]
    fn skips_non_applicable_weekdays() {
        let mut window = overnight_window();
        // Mondays only
        window.weekdays = vec![0];
        let settings = settings_with(window);
        // 2021-06-01 is a Tuesday
        let t = utc_millis(2021, 6, 1, 23, 30);
        assert_eq!(
            settings.adjust_for_quiet_hours(t, Priority::Normal),
            (t, false)
        );
    }

    #[test]
    fn adjustment_never_moves_backward() {
        let settings = settings_with(overnight_window());
        for (h, min) in [(22u32, 0u32), (23, 59), (0, 0), (3, 30), (7, 59)].iter() {
            let t = utc_millis(2021, 6, 1, *h, *min);
            let (adjusted, _) = settings.adjust_for_quiet_hours(t, Priority::Normal);
            assert!(adjusted >= t);
        }
    }

    #[test]
    fn respects_user_timezone() {
        let mut settings = settings_with(overnight_window());
        settings.timezone = chrono_tz::Europe::Oslo;
        // 21:30 UTC is 23:30 in Oslo during summer time
        let t = utc_millis(2021, 6, 1, 21, 30);
        let (adjusted, moved) = settings.adjust_for_quiet_hours(t, Priority::Normal);
        assert!(moved);
        // 08:00 Oslo next day == 06:00 UTC
        assert_eq!(adjusted, utc_millis(2021, 6, 2, 6, 0));
    }
}
