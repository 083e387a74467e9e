use crate::error::NudgeError;
use crate::shared::usecase::{execute, UseCase};
use nudge_scheduler_domain::{
    timing::{alternative_hours, at_hour, clamp_hour, confidence_from_history},
    Algorithm, EngagementMetrics, PredictionRequest, TimingPrediction,
    MIN_INTERACTIONS_FOR_ANALYSIS,
};
use nudge_scheduler_infra::NudgeContext;
use tracing::warn;

/// The full personalized timing pipeline: behavior analysis, model
/// prediction, engagement estimate, alternatives, confidence and a
/// reasoning trace. Callers that cannot tolerate failure use
/// `predict_optimal_timing_with_fallback` instead.
#[derive(Debug)]
pub struct PredictOptimalTimingUseCase {
    pub request: PredictionRequest,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    InsufficientData { points: usize, required: usize },
    ModelPrediction(String),
}

impl From<UseCaseError> for NudgeError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::InsufficientData { points, required } => {
                Self::InsufficientData { points, required }
            }
            UseCaseError::ModelPrediction(msg) => Self::ModelPrediction(msg),
        }
    }
}

#[async_trait::async_trait]
impl UseCase for PredictOptimalTimingUseCase {
    type Response = TimingPrediction;

    type Error = UseCaseError;

    const NAME: &'static str = "PredictOptimalTiming";

    async fn execute(&mut self, ctx: &NudgeContext) -> Result<Self::Response, Self::Error> {
        // Step 1: behavior analysis. Too little history is the
        // caller's problem and passes through untouched.
        let interactions = ctx
            .repos
            .interactions
            .find_by_user(&self.request.user_id)
            .await;
        if interactions.len() < MIN_INTERACTIONS_FOR_ANALYSIS {
            return Err(UseCaseError::InsufficientData {
                points: interactions.len(),
                required: MIN_INTERACTIONS_FOR_ANALYSIS,
            });
        }
        let tz = ctx
            .services
            .user_preferences
            .get_settings(&self.request.user_id)
            .await
            .map(|settings| settings.timezone)
            .unwrap_or(chrono_tz::UTC);
        let metrics =
            EngagementMetrics::analyze(self.request.user_id.clone(), &interactions, tz);

        // Steps 2-5: anything unexpected in here surfaces as a model
        // prediction failure.
        self.predict_from_metrics(ctx, &metrics)
            .await
            .map_err(|e| UseCaseError::ModelPrediction(e.to_string()))
    }
}

impl PredictOptimalTimingUseCase {
    async fn predict_from_metrics(
        &self,
        ctx: &NudgeContext,
        metrics: &EngagementMetrics,
    ) -> anyhow::Result<TimingPrediction> {
        let request = &self.request;

        // Step 2: model call, with the analysis result as a hint
        let mut context = request.context.clone();
        if let Some(optimal) = metrics.optimal_hour() {
            context.insert("optimal_hour".into(), optimal.to_string());
        }
        let raw_hour = ctx
            .services
            .timing_predictor
            .predict_hour(&request.user_id, request.kind, request.default_hour, &context)
            .await?;
        let hour = clamp_hour(raw_hour);

        // Steps 3-5: engagement estimate, alternatives, confidence
        let engagement_probability = metrics.engagement_probability(request.kind, hour);
        let default_probability =
            metrics.engagement_probability(request.kind, clamp_hour(request.default_hour));

        let mut reasoning = format!(
            "Model predicted hour {} (default {})",
            hour, request.default_hour
        );
        if !metrics.peak_engagement_hours.is_empty() {
            reasoning.push_str(&format!(
                "; peak engagement hours: {:?}",
                metrics.peak_engagement_hours
            ));
        }
        if !request.context.is_empty() {
            let mut keys: Vec<&String> = request.context.keys().collect();
            keys.sort();
            reasoning.push_str(&format!("; context: {:?}", keys));
        }
        if hour != raw_hour {
            reasoning.push_str(&format!(
                "; clamped from {} into the delivery window",
                raw_hour
            ));
        }

        Ok(TimingPrediction {
            user_id: request.user_id.clone(),
            predicted_at: at_hour(request.target_day, hour),
            predicted_hour: hour,
            confidence: confidence_from_history(metrics.total_notifications),
            engagement_probability,
            alternative_hours: alternative_hours(hour),
            reasoning,
            fallback_used: false,
            constraint_applied: hour != raw_hour,
            quiet_hours_adjusted: false,
            improvement_score: Some(engagement_probability - default_probability),
            algorithm_used: Some(Algorithm::MlPersonalized),
            ab_test_group: None,
            processing_time_ms: None,
        })
    }
}

/// Runs the full pipeline but converts every failure, whatever the
/// stage, into a low-confidence prediction pinned to the request's
/// default hour. This function never fails.
pub async fn predict_optimal_timing_with_fallback(
    ctx: &NudgeContext,
    request: &PredictionRequest,
) -> TimingPrediction {
    let usecase = PredictOptimalTimingUseCase {
        request: request.clone(),
    };
    match execute(usecase, ctx).await {
        Ok(prediction) => prediction,
        Err(e) => {
            warn!(
                "Timing prediction for user {} fell back to the default hour: {:?}",
                request.user_id, e
            );
            TimingPrediction::fallback(request, &format!("{:?}", e))
        }
    }
}
