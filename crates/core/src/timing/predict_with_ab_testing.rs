use crate::shared::usecase::UseCase;
use crate::timing::predict_optimal_timing::predict_optimal_timing_with_fallback;
use nudge_scheduler_domain::{
    timing::{alternative_hours, at_hour},
    Algorithm, PredictionRequest, TimingPrediction,
};
use nudge_scheduler_infra::{NudgeContext, CONTROL_GROUP};

/// Routes a prediction through the A/B experiment: control users get
/// the plain default hour, everyone else the personalized pipeline.
/// Both arms tag the prediction with the group so downstream
/// engagement data can be attributed.
#[derive(Debug)]
pub struct PredictWithABTestingUseCase {
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
impl UseCase for PredictWithABTestingUseCase {
    type Response = TimingPrediction;

    type Error = UseCaseError;

    const NAME: &'static str = "PredictWithABTesting";

    async fn execute(&mut self, ctx: &NudgeContext) -> Result<Self::Response, Self::Error> {
        let request = &self.request;
        let group = ctx.services.ab_assignment.get_group(&request.user_id).await;

        if group == CONTROL_GROUP {
            // The control arm is the untouched baseline: the default
            // hour passes through without even the delivery-window clamp
            let hour = request.default_hour;
            return Ok(TimingPrediction {
                user_id: request.user_id.clone(),
                predicted_at: at_hour(request.target_day, hour),
                predicted_hour: hour,
                confidence: 0.5,
                engagement_probability: 0.0,
                alternative_hours: alternative_hours(hour),
                reasoning: "Control group: default hour without personalization".into(),
                fallback_used: false,
                constraint_applied: false,
                quiet_hours_adjusted: false,
                improvement_score: None,
                algorithm_used: Some(Algorithm::Default),
                ab_test_group: Some(group),
                processing_time_ms: None,
            });
        }

        let mut prediction = predict_optimal_timing_with_fallback(ctx, request).await;
        prediction.ab_test_group = Some(group);
        Ok(prediction)
    }
}
