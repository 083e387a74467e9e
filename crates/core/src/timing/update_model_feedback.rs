use crate::error::NudgeError;
use crate::shared::usecase::UseCase;
use chrono::prelude::*;
use nudge_scheduler_domain::TrainingSignal;
use nudge_scheduler_domain::ID;
use nudge_scheduler_infra::NudgeContext;

/// Converts a user's accumulated feedback events into training
/// signals and hands them to the prediction model. Returns whether
/// the model accepted anything.
#[derive(Debug)]
pub struct UpdateModelFeedbackUseCase {
    pub user_id: ID,
}

#[derive(Debug)]
pub enum UseCaseError {
    ModelUpdate(String),
}

impl From<UseCaseError> for NudgeError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::ModelUpdate(msg) => Self::ModelPrediction(msg),
        }
    }
}

#[async_trait::async_trait]
impl UseCase for UpdateModelFeedbackUseCase {
    type Response = bool;

    type Error = UseCaseError;

    const NAME: &'static str = "UpdateModelFeedback";

    async fn execute(&mut self, ctx: &NudgeContext) -> Result<Self::Response, Self::Error> {
        let events = ctx.services.feedback.get_user_feedback(&self.user_id).await;
        if events.is_empty() {
            return Ok(false);
        }

        let tz = ctx
            .services
            .user_preferences
            .get_settings(&self.user_id)
            .await
            .map(|settings| settings.timezone)
            .unwrap_or(chrono_tz::UTC);

        let signals: Vec<TrainingSignal> = events
            .iter()
            .map(|event| {
                let sent_hour = tz.timestamp_millis(event.sent_at).hour();
                TrainingSignal::from_event(event, sent_hour)
            })
            .collect();

        ctx.services
            .timing_predictor
            .update_with_feedback(&self.user_id, &signals)
            .await
            .map_err(|e| UseCaseError::ModelUpdate(e.to_string()))
    }
}
