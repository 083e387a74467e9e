use crate::notification::NotificationKind;
use crate::shared::entity::{Entity, ID};
use chrono::prelude::*;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Minimum number of historical interactions before any behavior
/// analysis is meaningful.
pub const MIN_INTERACTIONS_FOR_ANALYSIS: usize = 5;

/// An hour-of-day bucket counts as a peak engagement hour when its
/// engagement rate exceeds this threshold.
pub const PEAK_HOUR_THRESHOLD: f64 = 0.6;

/// A weekday counts as preferred when its engagement rate exceeds this
/// threshold.
pub const PREFERRED_DAY_THRESHOLD: f64 = 0.5;

/// One historical delivery and what the user did with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationInteraction {
    pub id: ID,
    pub user_id: ID,
    pub kind: NotificationKind,
    /// Unix millis at which the notification was delivered
    pub sent_at: i64,
    /// Unix millis at which the user opened it, if ever
    pub opened_at: Option<i64>,
    pub clicked: bool,
}

impl Entity for NotificationInteraction {
    fn id(&self) -> &ID {
        &self.id
    }
}

/// A snapshot of a user's engagement behavior, derived from their
/// interaction history. Recomputed on demand, never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementMetrics {
    pub user_id: ID,
    pub total_notifications: usize,
    pub opened: usize,
    pub clicked: usize,
    pub open_rate: f64,
    pub click_rate: f64,
    /// Average minutes between delivery and open, over opened ones
    pub avg_open_delay_min: f64,
    /// Hours of day (user-local) where the engagement rate exceeds
    /// `PEAK_HOUR_THRESHOLD`, sorted ascending
    pub peak_engagement_hours: Vec<u32>,
    /// Weekdays (0 = Monday .. 6 = Sunday) with engagement rate above
    /// `PREFERRED_DAY_THRESHOLD`
    pub preferred_days: Vec<u32>,
    pub engagement_rate: f64,
}

impl EngagementMetrics {
    /// Derives a fresh metrics snapshot from raw history. Hours and
    /// weekdays are bucketed in the user's timezone.
    pub fn analyze(user_id: ID, interactions: &[NotificationInteraction], tz: Tz) -> Self {
        let total = interactions.len();
        let opened = interactions.iter().filter(|i| i.opened_at.is_some()).count();
        let clicked = interactions.iter().filter(|i| i.clicked).count();

        let open_rate = rate(opened, total);
        let click_rate = rate(clicked, total);

        let open_delays: Vec<i64> = interactions
            .iter()
            .filter_map(|i| i.opened_at.map(|at| at - i.sent_at))
            .filter(|delay| *delay >= 0)
            .collect();
        let avg_open_delay_min = if open_delays.is_empty() {
            0.0
        } else {
            open_delays.iter().sum::<i64>() as f64 / open_delays.len() as f64 / 60_000.0
        };

        let mut hour_buckets: HashMap<u32, (usize, usize)> = HashMap::new();
        let mut day_buckets: HashMap<u32, (usize, usize)> = HashMap::new();
        for interaction in interactions {
            let local = tz.timestamp_millis(interaction.sent_at);
            let engaged = interaction.opened_at.is_some() || interaction.clicked;

            let hour = hour_buckets.entry(local.hour()).or_insert((0, 0));
            hour.0 += 1;
            let day = day_buckets
                .entry(local.weekday().num_days_from_monday())
                .or_insert((0, 0));
            day.0 += 1;
            if engaged {
                hour.1 += 1;
                day.1 += 1;
            }
        }

        let mut peak_engagement_hours: Vec<u32> = hour_buckets
            .iter()
            .filter(|(_, (sent, engaged))| rate(*engaged, *sent) > PEAK_HOUR_THRESHOLD)
            .map(|(hour, _)| *hour)
            .collect();
        peak_engagement_hours.sort_unstable();

        let mut preferred_days: Vec<u32> = day_buckets
            .iter()
            .filter(|(_, (sent, engaged))| rate(*engaged, *sent) > PREFERRED_DAY_THRESHOLD)
            .map(|(day, _)| *day)
            .collect();
        preferred_days.sort_unstable();

        Self {
            user_id,
            total_notifications: total,
            opened,
            clicked,
            open_rate,
            click_rate,
            avg_open_delay_min,
            peak_engagement_hours,
            preferred_days,
            // Opens dominate, clicks are a stronger but rarer signal
            engagement_rate: open_rate * 0.7 + click_rate * 0.3,
        }
    }

    /// Weekly ceiling of non-urgent notifications, tiered by how
    /// engaged the user is.
    pub fn frequency_limit(&self) -> usize {
        if self.engagement_rate >= 0.7 {
            10
        } else if self.engagement_rate >= 0.4 {
            7
        } else {
            3
        }
    }

    /// The single best hour to deliver at, if the history shows one.
    pub fn optimal_hour(&self) -> Option<u32> {
        self.peak_engagement_hours.first().copied()
    }

    /// Estimated probability that a notification of `kind` delivered
    /// at `hour` gets engaged with.
    pub fn engagement_probability(&self, kind: NotificationKind, hour: u32) -> f64 {
        let p = self.engagement_rate
            * kind.engagement_multiplier()
            * time_of_day_multiplier(hour);
        p.min(1.0).max(0.0)
    }
}

/// Evening hours convert better, sleep hours a lot worse.
pub fn time_of_day_multiplier(hour: u32) -> f64 {
    match hour {
        18..=21 => 1.1,
        22 | 23 | 0..=7 => 0.7,
        _ => 1.0,
    }
}

/// Coarse activity summary exposed next to the metrics snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityPattern {
    pub peak_hours: Vec<u32>,
    pub quiet_hours: Vec<u32>,
    /// Whether the user engages more on weekends than on weekdays
    pub weekend_shift: bool,
    pub timezone: Tz,
}

impl ActivityPattern {
    pub fn from_history(interactions: &[NotificationInteraction], tz: Tz) -> Self {
        let mut hour_buckets: HashMap<u32, (usize, usize)> = HashMap::new();
        let mut weekday = (0usize, 0usize);
        let mut weekend = (0usize, 0usize);
        for interaction in interactions {
            let local = tz.timestamp_millis(interaction.sent_at);
            let engaged = interaction.opened_at.is_some() || interaction.clicked;

            let hour = hour_buckets.entry(local.hour()).or_insert((0, 0));
            hour.0 += 1;
            let day = match local.weekday() {
                Weekday::Sat | Weekday::Sun => &mut weekend,
                _ => &mut weekday,
            };
            day.0 += 1;
            if engaged {
                hour.1 += 1;
                day.1 += 1;
            }
        }

        let mut peak_hours = Vec::new();
        let mut quiet_hours = Vec::new();
        for (hour, (sent, engaged)) in hour_buckets.iter() {
            let r = rate(*engaged, *sent);
            if r > PEAK_HOUR_THRESHOLD {
                peak_hours.push(*hour);
            } else if r < 0.2 {
                quiet_hours.push(*hour);
            }
        }
        peak_hours.sort_unstable();
        quiet_hours.sort_unstable();

        Self {
            peak_hours,
            quiet_hours,
            weekend_shift: rate(weekend.1, weekend.0) > rate(weekday.1, weekday.0),
            timezone: tz,
        }
    }
}

fn rate(num: usize, denom: usize) -> f64 {
    if denom == 0 {
        0.0
    } else {
        num as f64 / denom as f64
    }
}
