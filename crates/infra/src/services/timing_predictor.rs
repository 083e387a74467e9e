use nudge_scheduler_domain::{
    timing::clamp_hour, NotificationKind, PredictionRequest, TrainingSignal, ID,
};
use std::collections::HashMap;
use tracing::info;

/// The ML timing model, specified purely as a capability: any model
/// can sit behind this boundary.
#[async_trait::async_trait]
pub trait ITimingPredictor: Send + Sync {
    async fn predict_hour(
        &self,
        user_id: &ID,
        kind: NotificationKind,
        default_hour: u32,
        context: &HashMap<String, String>,
    ) -> anyhow::Result<u32>;

    async fn batch_predict(&self, requests: &[PredictionRequest]) -> anyhow::Result<Vec<u32>>;

    async fn update_with_feedback(
        &self,
        user_id: &ID,
        signals: &[TrainingSignal],
    ) -> anyhow::Result<bool>;
}

/// Stand-in model used until a real one is deployed. Deterministic:
/// it honors an `optimal_hour` hint from the caller's context and
/// otherwise nudges preparation notifications towards the evening.
pub struct HeuristicTimingPredictor {}

impl HeuristicTimingPredictor {
    pub fn new() -> Self {
        Self {}
    }

    fn pick_hour(
        kind: NotificationKind,
        default_hour: u32,
        context: &HashMap<String, String>,
    ) -> u32 {
        if let Some(hint) = context.get("optimal_hour") {
            if let Ok(hour) = hint.parse::<u32>() {
                return clamp_hour(hour);
            }
        }
        match kind {
            NotificationKind::Preparation => clamp_hour(default_hour.max(19)),
            _ => clamp_hour(default_hour),
        }
    }
}

#[async_trait::async_trait]
impl ITimingPredictor for HeuristicTimingPredictor {
    async fn predict_hour(
        &self,
        _user_id: &ID,
        kind: NotificationKind,
        default_hour: u32,
        context: &HashMap<String, String>,
    ) -> anyhow::Result<u32> {
        Ok(Self::pick_hour(kind, default_hour, context))
    }

    async fn batch_predict(&self, requests: &[PredictionRequest]) -> anyhow::Result<Vec<u32>> {
        Ok(requests
            .iter()
            .map(|r| Self::pick_hour(r.kind, r.default_hour, &r.context))
            .collect())
    }

    async fn update_with_feedback(
        &self,
        user_id: &ID,
        signals: &[TrainingSignal],
    ) -> anyhow::Result<bool> {
        // The heuristic model has no weights to move, but the signals
        // are still acknowledged so callers behave the same as with a
        // trainable model behind this trait.
        info!(
            "Received {} training signals for user {}",
            signals.len(),
            user_id
        );
        Ok(!signals.is_empty())
    }
}
