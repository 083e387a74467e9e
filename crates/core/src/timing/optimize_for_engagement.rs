use crate::shared::usecase::UseCase;
use nudge_scheduler_domain::{
    timing::{alternative_hours, at_hour, clamp_hour, confidence_from_history},
    Algorithm, EngagementMetrics, PredictionRequest, TimingPrediction,
    MIN_INTERACTIONS_FOR_ANALYSIS,
};
use nudge_scheduler_infra::NudgeContext;

/// Picks the delivery hour purely from observed engagement peaks,
/// without consulting the prediction model. Used when the model is
/// disabled for a user but their history is still worth exploiting.
#[derive(Debug)]
pub struct OptimizeForEngagementUseCase {
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
impl UseCase for OptimizeForEngagementUseCase {
    type Response = TimingPrediction;

    type Error = UseCaseError;

    const NAME: &'static str = "OptimizeForEngagement";

    async fn execute(&mut self, ctx: &NudgeContext) -> Result<Self::Response, Self::Error> {
        let request = &self.request;
        let interactions = ctx.repos.interactions.find_by_user(&request.user_id).await;
        if interactions.len() < MIN_INTERACTIONS_FOR_ANALYSIS {
            return Ok(TimingPrediction::fallback(
                request,
                "Not enough history to optimize for engagement",
            ));
        }
        let tz = ctx
            .services
            .user_preferences
            .get_settings(&request.user_id)
            .await
            .map(|settings| settings.timezone)
            .unwrap_or(chrono_tz::UTC);
        let metrics = EngagementMetrics::analyze(request.user_id.clone(), &interactions, tz);

        // Closest peak wins; on a tie the earlier hour is kept so
        // notifications never drift later than they have to.
        let default_hour = clamp_hour(request.default_hour);
        let best_peak = metrics
            .peak_engagement_hours
            .iter()
            .copied()
            .map(clamp_hour)
            .min_by_key(|h| {
                let distance = (*h as i64 - default_hour as i64).abs();
                (distance, *h)
            });

        let hour = match best_peak {
            Some(hour) => hour,
            None => {
                return Ok(TimingPrediction::fallback(
                    request,
                    "No engagement peaks found in history",
                ))
            }
        };

        Ok(TimingPrediction {
            user_id: request.user_id.clone(),
            predicted_at: at_hour(request.target_day, hour),
            predicted_hour: hour,
            confidence: confidence_from_history(metrics.total_notifications),
            engagement_probability: metrics.engagement_probability(request.kind, hour),
            alternative_hours: alternative_hours(hour),
            reasoning: format!(
                "Engagement peak at hour {} closest to default {}",
                hour, request.default_hour
            ),
            fallback_used: false,
            constraint_applied: false,
            quiet_hours_adjusted: false,
            improvement_score: None,
            algorithm_used: Some(Algorithm::Default),
            ab_test_group: None,
            processing_time_ms: None,
        })
    }
}
