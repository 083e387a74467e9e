mod course;
mod engagement;
mod feedback;
mod notification;
mod realtime;
mod settings;
mod shared;
pub mod timing;

pub use course::{Course, CourseStop, INTRA_STOP_BUFFER_MIN};
pub use engagement::{
    time_of_day_multiplier, ActivityPattern, EngagementMetrics, NotificationInteraction,
    MIN_INTERACTIONS_FOR_ANALYSIS, PEAK_HOUR_THRESHOLD, PREFERRED_DAY_THRESHOLD,
};
pub use feedback::{FeedbackEvent, TrainingSignal};
pub use notification::{
    NotificationKind, NotificationStatus, Priority, ScheduledNotification,
};
pub use realtime::{RealTimeConditions, TrafficLevel, WeatherCondition, MAX_ADVANCE_MIN};
pub use settings::{KindToggles, QuietHours, TimingOffsets, UserNotificationSettings};
pub use shared::entity::{Entity, ID};
pub use timing::{
    Algorithm, PredictionRequest, TimingPrediction, MAX_DELIVERY_HOUR, MIN_DELIVERY_HOUR,
};
