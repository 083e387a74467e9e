use crate::notification::NotificationKind;
use crate::shared::entity::ID;
use serde::{Deserialize, Serialize};

/// A user's reaction to one delivered notification, as collected by
/// the feedback service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub user_id: ID,
    pub notification_id: ID,
    pub kind: NotificationKind,
    /// Unix millis of the delivery this feedback refers to
    pub sent_at: i64,
    pub opened: bool,
    pub open_delay_min: Option<i64>,
    /// Optional 1-5 usefulness rating
    pub rating: Option<u8>,
}

/// The shape forwarded to the timing predictor's update capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSignal {
    pub user_id: ID,
    pub kind: NotificationKind,
    /// Hour of day the delivery happened at
    pub sent_hour: u32,
    /// 0.0 (ignored) .. 1.0 (opened fast and rated well)
    pub outcome: f64,
}

impl TrainingSignal {
    /// Collapses a feedback event into a single outcome score.
    pub fn from_event(event: &FeedbackEvent, sent_hour: u32) -> Self {
        let mut outcome: f64 = if event.opened { 0.6 } else { 0.0 };
        if let Some(delay) = event.open_delay_min {
            if delay <= 10 {
                outcome += 0.2;
            }
        }
        if let Some(rating) = event.rating {
            outcome += f64::from(rating.min(5)) / 25.0;
        }
        Self {
            user_id: event.user_id.clone(),
            kind: event.kind,
            sent_hour,
            outcome: outcome.min(1.0),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn event(opened: bool, delay: Option<i64>, rating: Option<u8>) -> FeedbackEvent {
        FeedbackEvent {
            user_id: ID::new(),
            notification_id: ID::new(),
            kind: NotificationKind::Departure,
            sent_at: 0,
            opened,
            open_delay_min: delay,
            rating,
        }
    }

    #[test]
    fn ignored_notifications_score_zero() {
        let signal = TrainingSignal::from_event(&event(false, None, None), 12);
        assert!((signal.outcome - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn fast_opens_with_good_ratings_score_high() {
        let signal = TrainingSignal::from_event(&event(true, Some(3), Some(5)), 12);
        assert!((signal.outcome - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn outcome_is_capped_at_one() {
        let signal = TrainingSignal::from_event(&event(true, Some(1), Some(5)), 12);
        assert!(signal.outcome <= 1.0);
    }
}
