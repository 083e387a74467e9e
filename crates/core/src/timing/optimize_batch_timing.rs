use crate::shared::usecase::UseCase;
use nudge_scheduler_domain::{
    timing::{alternative_hours, at_hour, clamp_hour},
    Algorithm, PredictionRequest, TimingPrediction,
};
use nudge_scheduler_infra::NudgeContext;
use tracing::warn;

/// Predicts delivery hours for many users in one model round trip.
/// The per-user analysis pipeline is skipped here: batch callers
/// (course imports, campaign sends) trade precision for a single
/// upstream call.
#[derive(Debug)]
pub struct OptimizeBatchTimingUseCase {
    pub requests: Vec<PredictionRequest>,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {}

impl From<UseCaseError> for crate::error::NudgeError {
    fn from(e: UseCaseError) -> Self {
        match e {}
    }
}

#[async_trait::async_trait]
impl UseCase for OptimizeBatchTimingUseCase {
    type Response = Vec<TimingPrediction>;

    type Error = UseCaseError;

    const NAME: &'static str = "OptimizeBatchTiming";

    async fn execute(&mut self, ctx: &NudgeContext) -> Result<Self::Response, Self::Error> {
        if self.requests.is_empty() {
            return Ok(Vec::new());
        }

        let started = ctx.sys.get_timestamp_millis();
        let hours = match ctx.services.timing_predictor.batch_predict(&self.requests).await {
            Ok(hours) if hours.len() == self.requests.len() => hours,
            Ok(hours) => {
                warn!(
                    "Batch prediction returned {} hours for {} requests",
                    hours.len(),
                    self.requests.len()
                );
                return Ok(self
                    .requests
                    .iter()
                    .map(|r| TimingPrediction::fallback(r, "Batch prediction size mismatch"))
                    .collect());
            }
            Err(e) => {
                warn!("Batch prediction failed: {:?}", e);
                return Ok(self
                    .requests
                    .iter()
                    .map(|r| TimingPrediction::fallback(r, "Batch prediction failed"))
                    .collect());
            }
        };
        let elapsed = ctx.sys.get_timestamp_millis() - started;
        let per_item_ms = elapsed / self.requests.len() as i64;

        Ok(self
            .requests
            .iter()
            .zip(hours)
            .map(|(request, raw_hour)| {
                let hour = clamp_hour(raw_hour);
                TimingPrediction {
                    user_id: request.user_id.clone(),
                    predicted_at: at_hour(request.target_day, hour),
                    predicted_hour: hour,
                    confidence: 0.5,
                    engagement_probability: 0.0,
                    alternative_hours: alternative_hours(hour),
                    reasoning: "Batch prediction".into(),
                    fallback_used: false,
                    constraint_applied: hour != raw_hour,
                    quiet_hours_adjusted: false,
                    improvement_score: None,
                    algorithm_used: Some(Algorithm::MlPersonalized),
                    ab_test_group: None,
                    processing_time_ms: Some(per_item_ms),
                }
            })
            .collect())
    }
}
