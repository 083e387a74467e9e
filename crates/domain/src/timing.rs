use crate::notification::NotificationKind;
use crate::shared::entity::ID;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Earliest hour of day a personalized delivery may be placed at.
pub const MIN_DELIVERY_HOUR: u32 = 8;
/// Latest hour of day a personalized delivery may be placed at.
pub const MAX_DELIVERY_HOUR: u32 = 22;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    Default,
    MlPersonalized,
}

/// Input to the timing pipeline: which user, what kind of
/// notification, the hour to fall back to, and free-form context
/// forwarded to the predictor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub user_id: ID,
    pub kind: NotificationKind,
    /// Hour of day used whenever personalization cannot improve on it
    pub default_hour: u32,
    /// The day (unix millis, midnight user-local) the delivery belongs to
    pub target_day: i64,
    pub context: HashMap<String, String>,
}

/// Outcome of the timing pipeline. Every degradation path is visible
/// through the flags instead of being swallowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingPrediction {
    pub user_id: ID,
    /// Unix millis of the suggested delivery moment
    pub predicted_at: i64,
    pub predicted_hour: u32,
    pub confidence: f64,
    pub engagement_probability: f64,
    /// Up to four nearby hours the caller may pick instead
    pub alternative_hours: Vec<u32>,
    /// Free-text trace of which factors shaped the prediction
    pub reasoning: String,
    pub fallback_used: bool,
    pub constraint_applied: bool,
    pub quiet_hours_adjusted: bool,
    pub improvement_score: Option<f64>,
    pub algorithm_used: Option<Algorithm>,
    pub ab_test_group: Option<String>,
    pub processing_time_ms: Option<i64>,
}

impl TimingPrediction {
    /// The guaranteed-safe result: pinned to the request's default
    /// hour at low confidence.
    pub fn fallback(request: &PredictionRequest, reason: &str) -> Self {
        let hour = clamp_hour(request.default_hour);
        Self {
            user_id: request.user_id.clone(),
            predicted_at: at_hour(request.target_day, hour),
            predicted_hour: hour,
            confidence: 0.3,
            engagement_probability: 0.0,
            alternative_hours: alternative_hours(hour),
            reasoning: format!("Fallback to default hour {}: {}", hour, reason),
            fallback_used: true,
            constraint_applied: hour != request.default_hour,
            quiet_hours_adjusted: false,
            improvement_score: None,
            algorithm_used: Some(Algorithm::Default),
            ab_test_group: None,
            processing_time_ms: None,
        }
    }
}

/// Confidence grows with the amount of history, capped at 0.9.
pub fn confidence_from_history(total_notifications: usize) -> f64 {
    (0.5 + (total_notifications as f64 / 100.0) * 0.4).min(0.9)
}

pub fn clamp_hour(hour: u32) -> u32 {
    hour.max(MIN_DELIVERY_HOUR).min(MAX_DELIVERY_HOUR)
}

/// Nearby hours a delivery could move to: the predicted hour shifted
/// by one and two hours either way, kept inside the delivery window.
pub fn alternative_hours(hour: u32) -> Vec<u32> {
    let hour = hour as i64;
    [-2i64, -1, 1, 2]
        .iter()
        .map(|offset| hour + offset)
        .filter(|h| *h >= MIN_DELIVERY_HOUR as i64 && *h <= MAX_DELIVERY_HOUR as i64)
        .map(|h| h as u32)
        .collect()
}

/// Places an hour of day onto a target day given as midnight millis.
pub fn at_hour(target_day_midnight: i64, hour: u32) -> i64 {
    target_day_midnight + (hour as i64) * 60 * 60 * 1000
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn confidence_is_capped() {
        assert!((confidence_from_history(0) - 0.5).abs() < f64::EPSILON);
        assert!((confidence_from_history(50) - 0.7).abs() < f64::EPSILON);
        assert!((confidence_from_history(100) - 0.9).abs() < f64::EPSILON);
        assert!((confidence_from_history(1000) - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn alternatives_stay_inside_the_delivery_window() {
        assert_eq!(alternative_hours(12), vec![10, 11, 13, 14]);
        assert_eq!(alternative_hours(8), vec![9, 10]);
        assert_eq!(alternative_hours(9), vec![8, 10, 11]);
        assert_eq!(alternative_hours(22), vec![20, 21]);
        assert!(alternative_hours(12).len() <= 4);
    }

    #[test]
    fn hours_are_clamped_to_the_window() {
        assert_eq!(clamp_hour(3), 8);
        assert_eq!(clamp_hour(23), 22);
        assert_eq!(clamp_hour(14), 14);
    }
}
