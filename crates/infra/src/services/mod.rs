mod ab_assignment;
mod duplicate_detector;
mod feedback;
mod realtime_context;
mod timing_predictor;
mod travel_time;
mod user_preferences;

pub use ab_assignment::{
    HashedABAssignmentService, IABAssignmentService, InMemoryABAssignmentService,
    CONTROL_GROUP, ML_GROUP,
};
pub use duplicate_detector::{IDuplicateDetector, RepoDuplicateDetector, DUPLICATE_WINDOW_MILLIS};
pub use feedback::{IFeedbackService, InMemoryFeedbackService};
pub use realtime_context::{IRealTimeContextService, InMemoryRealTimeContextService};
pub use timing_predictor::{HeuristicTimingPredictor, ITimingPredictor};
pub use travel_time::{
    HttpTravelTimeCalculator, ITravelTimeCalculator, StaticTravelTimeCalculator,
};
pub use user_preferences::{IUserPreferencesService, InMemoryUserPreferencesService};

use crate::config::Config;
use crate::repos::Repos;
use std::sync::Arc;

/// The external collaborators the engines orchestrate. Everything is
/// a trait object so deployments (and tests) can substitute any of
/// them.
#[derive(Clone)]
pub struct Services {
    pub user_preferences: Arc<dyn IUserPreferencesService>,
    pub travel_time: Arc<dyn ITravelTimeCalculator>,
    pub duplicate_detector: Arc<dyn IDuplicateDetector>,
    pub timing_predictor: Arc<dyn ITimingPredictor>,
    pub ab_assignment: Arc<dyn IABAssignmentService>,
    pub feedback: Arc<dyn IFeedbackService>,
    pub realtime_context: Arc<dyn IRealTimeContextService>,
}

impl Services {
    pub fn create(repos: &Repos, config: &Config) -> Self {
        let travel_time: Arc<dyn ITravelTimeCalculator> = match &config.travel_time_api_url {
            Some(url) => Arc::new(HttpTravelTimeCalculator::new(
                url.clone(),
                config.default_travel_time_min,
            )),
            None => Arc::new(StaticTravelTimeCalculator {
                minutes: config.default_travel_time_min,
            }),
        };

        Self {
            user_preferences: Arc::new(InMemoryUserPreferencesService::new()),
            travel_time,
            duplicate_detector: Arc::new(RepoDuplicateDetector::new(
                repos.notifications.clone(),
            )),
            timing_predictor: Arc::new(HeuristicTimingPredictor::new()),
            ab_assignment: Arc::new(HashedABAssignmentService {}),
            feedback: Arc::new(InMemoryFeedbackService::new()),
            realtime_context: Arc::new(InMemoryRealTimeContextService::new()),
        }
    }
}
