use crate::error::NudgeError;
use crate::shared::usecase::UseCase;
use nudge_scheduler_domain::{
    EngagementMetrics, ID, MIN_INTERACTIONS_FOR_ANALYSIS,
};
use nudge_scheduler_infra::NudgeContext;

/// Produces a fresh engagement snapshot for the user. Refuses to
/// analyze below `MIN_INTERACTIONS_FOR_ANALYSIS` history points;
/// anything derived from less would be noise.
#[derive(Debug)]
pub struct AnalyzeUserBehaviorUseCase {
    pub user_id: ID,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    InsufficientData { points: usize, required: usize },
}

impl From<UseCaseError> for NudgeError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::InsufficientData { points, required } => {
                Self::InsufficientData { points, required }
            }
        }
    }
}

#[async_trait::async_trait]
impl UseCase for AnalyzeUserBehaviorUseCase {
    type Response = EngagementMetrics;

    type Error = UseCaseError;

    const NAME: &'static str = "AnalyzeUserBehavior";

    async fn execute(&mut self, ctx: &NudgeContext) -> Result<Self::Response, Self::Error> {
        let interactions = ctx.repos.interactions.find_by_user(&self.user_id).await;
        if interactions.len() < MIN_INTERACTIONS_FOR_ANALYSIS {
            return Err(UseCaseError::InsufficientData {
                points: interactions.len(),
                required: MIN_INTERACTIONS_FOR_ANALYSIS,
            });
        }

        let tz = ctx
            .services
            .user_preferences
            .get_settings(&self.user_id)
            .await
            .map(|settings| settings.timezone)
            .unwrap_or(chrono_tz::UTC);

        Ok(EngagementMetrics::analyze(
            self.user_id.clone(),
            &interactions,
            tz,
        ))
    }
}
