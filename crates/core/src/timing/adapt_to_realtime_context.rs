use crate::shared::usecase::UseCase;
use crate::timing::predict_optimal_timing::predict_optimal_timing_with_fallback;
use nudge_scheduler_domain::{PredictionRequest, TimingPrediction};
use nudge_scheduler_infra::NudgeContext;
use tracing::warn;

/// Layers live conditions (weather, traffic, events, disruptions) on
/// top of a base prediction, moving the delivery earlier when getting
/// to the course will take longer than usual. Condition lookup
/// failures leave the base prediction untouched.
#[derive(Debug)]
pub struct AdaptToRealTimeContextUseCase {
    pub request: PredictionRequest,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {}

impl From<UseCaseError> for crate::error::NudgeError {
    fn from(e: UseCaseError) -> Self {
        match e {}
    }
}

#[async_trait::async_trait]
impl UseCase for AdaptToRealTimeContextUseCase {
    type Response = TimingPrediction;

    type Error = UseCaseError;

    const NAME: &'static str = "AdaptToRealTimeContext";

    async fn execute(&mut self, ctx: &NudgeContext) -> Result<Self::Response, Self::Error> {
        let request = &self.request;
        let mut prediction = predict_optimal_timing_with_fallback(ctx, request).await;

        let conditions = match ctx
            .services
            .realtime_context
            .current_conditions(&request.user_id)
            .await
        {
            Ok(conditions) => conditions,
            Err(e) => {
                warn!(
                    "Could not fetch real-time conditions for user {}: {:?}",
                    request.user_id, e
                );
                return Ok(prediction);
            }
        };

        let advance_min = conditions.recommended_advance_min();
        if advance_min > 0 {
            prediction.predicted_at -= advance_min * 60_000;
            prediction.predicted_hour = ((prediction.predicted_at - request.target_day)
                / 3_600_000)
                .rem_euclid(24) as u32;
            let factor = conditions.dominant_factor().unwrap_or("conditions");
            prediction
                .reasoning
                .push_str(&format!("; moved {} min earlier due to {}", advance_min, factor));
        }

        Ok(prediction)
    }
}
