use super::schedule_notification::ScheduleNotificationUseCase;
use crate::error::NudgeError;
use crate::shared::usecase::{execute, UseCase};
use crate::timing::predict_optimal_timing_with_fallback;
use chrono::prelude::*;
use nudge_scheduler_domain::{
    Course, NotificationKind, PredictionRequest, Priority, ScheduledNotification,
    UserNotificationSettings, INTRA_STOP_BUFFER_MIN,
};
use nudge_scheduler_infra::NudgeContext;
use std::collections::HashMap;
use tracing::info;

const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;
const MINUTE_MILLIS: i64 = 60 * 1000;

/// Derives up to three notifications from a planned course: a
/// preparation reminder the day before, a departure reminder ahead of
/// the first stop, and a move reminder between the first two stops.
/// Which of them exist depends on the user's configured offsets and
/// per-kind flags.
#[derive(Debug)]
pub struct ScheduleCourseNotificationsUseCase {
    pub course: Course,
}

#[derive(Debug)]
pub struct ScheduleCourseNotificationsResponse {
    pub scheduled: Vec<ScheduledNotification>,
    pub total_scheduled: usize,
    pub skipped: usize,
}

impl ScheduleCourseNotificationsResponse {
    fn empty() -> Self {
        Self {
            scheduled: Vec::new(),
            total_scheduled: 0,
            skipped: 0,
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    PreferencesUnavailable,
}

impl From<UseCaseError> for NudgeError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::PreferencesUnavailable => Self::Internal,
        }
    }
}

#[async_trait::async_trait]
impl UseCase for ScheduleCourseNotificationsUseCase {
    type Response = ScheduleCourseNotificationsResponse;

    type Error = UseCaseError;

    const NAME: &'static str = "ScheduleCourseNotifications";

    async fn execute(&mut self, ctx: &NudgeContext) -> Result<Self::Response, Self::Error> {
        let settings = ctx
            .services
            .user_preferences
            .get_settings(&self.course.user_id)
            .await
            .map_err(|_| UseCaseError::PreferencesUnavailable)?;

        if !settings.enabled {
            // Disabled notifications are a normal outcome, not an error
            return Ok(ScheduleCourseNotificationsResponse::empty());
        }

        let mut candidates = Vec::new();
        if let Some(preparation) = self.preparation_candidate(ctx, &settings).await {
            candidates.push(preparation);
        }
        if let Some(departure) = self.departure_candidate(ctx, &settings).await {
            candidates.push(departure);
        }
        if let Some(move_candidate) = self.move_candidate(ctx, &settings) {
            candidates.push(move_candidate);
        }

        let mut response = ScheduleCourseNotificationsResponse::empty();
        for mut candidate in candidates {
            let (adjusted_at, _) =
                settings.adjust_for_quiet_hours(candidate.scheduled_at, candidate.priority);
            candidate.scheduled_at = adjusted_at;

            let usecase = ScheduleNotificationUseCase {
                notification: candidate.clone(),
            };
            match execute(usecase, ctx).await {
                Ok(_) => {
                    candidate.status = nudge_scheduler_domain::NotificationStatus::Scheduled;
                    response.scheduled.push(candidate);
                    response.total_scheduled += 1;
                }
                Err(e) => {
                    info!(
                        "Skipping {:?} notification for course {}: {:?}",
                        candidate.kind, self.course.id, e
                    );
                    response.skipped += 1;
                }
            }
        }

        Ok(response)
    }
}

impl ScheduleCourseNotificationsUseCase {
    fn base_notification(
        &self,
        kind: NotificationKind,
        priority: Priority,
        scheduled_at: i64,
        message: String,
        now: i64,
    ) -> ScheduledNotification {
        let mut notification = ScheduledNotification::new(
            self.course.user_id.clone(),
            kind,
            priority,
            scheduled_at,
            message,
            now,
        );
        notification.course_id = Some(self.course.id.clone());
        notification.deep_link = Some(format!("nudge://course/{}", self.course.id));
        notification
    }

    /// Day-before reminder at the configured hour. When the user has
    /// personalization enabled the hour is suggested by the timing
    /// engine instead, which never fails and degrades to the
    /// configured hour.
    async fn preparation_candidate(
        &self,
        ctx: &NudgeContext,
        settings: &UserNotificationSettings,
    ) -> Option<ScheduledNotification> {
        let hour = settings.offsets.day_before_hour?;
        if !settings.kinds.enabled_for(NotificationKind::Preparation) {
            return None;
        }
        let day_before = self.course.date - DAY_MILLIS;

        let scheduled_at = if settings.personalization_enabled {
            let request = PredictionRequest {
                user_id: self.course.user_id.clone(),
                kind: NotificationKind::Preparation,
                default_hour: hour,
                target_day: day_before,
                context: HashMap::new(),
            };
            predict_optimal_timing_with_fallback(ctx, &request)
                .await
                .predicted_at
        } else {
            day_before + (hour as i64) * 60 * MINUTE_MILLIS
        };

        Some(self.base_notification(
            NotificationKind::Preparation,
            Priority::Normal,
            scheduled_at,
            format!("Get ready for {} tomorrow", self.course.title),
            ctx.sys.get_timestamp_millis(),
        ))
    }

    /// Departure reminder: first stop arrival minus travel time minus
    /// the configured lead.
    async fn departure_candidate(
        &self,
        ctx: &NudgeContext,
        settings: &UserNotificationSettings,
    ) -> Option<ScheduledNotification> {
        let lead_min = settings.offsets.departure_lead_min?;
        if !settings.kinds.enabled_for(NotificationKind::Departure) {
            return None;
        }
        let first_stop = self.course.first_stop()?;

        let travel_min = ctx
            .services
            .travel_time
            .calculate(&first_stop.place_id, first_stop.arrival_at)
            .await
            .unwrap_or(ctx.config.default_travel_time_min);
        let scheduled_at =
            first_stop.arrival_at - (travel_min + lead_min) * MINUTE_MILLIS;

        Some(self.base_notification(
            NotificationKind::Departure,
            Priority::High,
            scheduled_at,
            format!("Leave soon for {}", first_stop.name),
            ctx.sys.get_timestamp_millis(),
        ))
    }

    /// Move reminder between the first and second stop. Only courses
    /// with at least two stops get one.
    fn move_candidate(
        &self,
        ctx: &NudgeContext,
        settings: &UserNotificationSettings,
    ) -> Option<ScheduledNotification> {
        let lead_min = settings.offsets.move_lead_min?;
        if !settings.kinds.enabled_for(NotificationKind::Move) {
            return None;
        }
        let second_stop = self.course.second_stop()?;

        let scheduled_at =
            second_stop.arrival_at - (INTRA_STOP_BUFFER_MIN + lead_min) * MINUTE_MILLIS;

        Some(self.base_notification(
            NotificationKind::Move,
            Priority::Normal,
            scheduled_at,
            format!("Time to head to {}", second_stop.name),
            ctx.sys.get_timestamp_millis(),
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::prelude::*;
    use nudge_scheduler_domain::{CourseStop, QuietHours, ID};
    use nudge_scheduler_infra::{
        InMemoryUserPreferencesService, NudgeContext, StaticTimeSys,
    };
    use std::sync::Arc;

    fn now_millis() -> i64 {
        // Monday 2021-06-07 12:00 UTC
        Utc.ymd(2021, 6, 7).and_hms(12, 0, 0).timestamp_millis()
    }

    fn course_on(date: i64, user_id: &ID, stops: Vec<CourseStop>) -> Course {
        Course {
            id: ID::new(),
            user_id: user_id.clone(),
            title: "Museum day".into(),
            date,
            stops,
        }
    }

    fn stop(name: &str, arrival_at: i64) -> CourseStop {
        CourseStop {
            place_id: format!("place-{}", name),
            name: name.into(),
            arrival_at,
        }
    }

    struct TestContext {
        ctx: NudgeContext,
        preferences: Arc<InMemoryUserPreferencesService>,
        user_id: ID,
    }

    fn setup() -> TestContext {
        let mut ctx = NudgeContext::create_inmemory();
        ctx.sys = Arc::new(StaticTimeSys(now_millis()));
        let preferences = Arc::new(InMemoryUserPreferencesService::new());
        ctx.services.user_preferences = preferences.clone();
        TestContext {
            ctx,
            preferences,
            user_id: ID::new(),
        }
    }

    fn settings_without_personalization(user_id: &ID) -> UserNotificationSettings {
        let mut settings = UserNotificationSettings::new(user_id.clone());
        settings.personalization_enabled = false;
        settings
    }

    #[tokio::test]
    async fn schedules_all_three_notifications_for_a_two_stop_course() {
        let TestContext {
            ctx,
            preferences,
            user_id,
        } = setup();
        preferences.set(settings_without_personalization(&user_id));

        // Wednesday 2021-06-09
        let course_day = Utc.ymd(2021, 6, 9).and_hms(0, 0, 0).timestamp_millis();
        let first_arrival = course_day + 10 * 3_600_000;
        let second_arrival = course_day + 14 * 3_600_000;
        let course = course_on(
            course_day,
            &user_id,
            vec![stop("museum", first_arrival), stop("park", second_arrival)],
        );

        let res = execute(ScheduleCourseNotificationsUseCase { course }, &ctx)
            .await
            .unwrap();
        assert_eq!(res.total_scheduled, 3);
        assert_eq!(res.skipped, 0);

        let kinds: Vec<_> = res.scheduled.iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![
                NotificationKind::Preparation,
                NotificationKind::Departure,
                NotificationKind::Move
            ]
        );

        // Preparation: day before at the default hour (20:00)
        assert_eq!(
            res.scheduled[0].scheduled_at,
            course_day - DAY_MILLIS + 20 * 3_600_000
        );
        // Departure: arrival - 30 min travel (static default) - 30 min lead
        assert_eq!(
            res.scheduled[1].scheduled_at,
            first_arrival - 60 * MINUTE_MILLIS
        );
        assert_eq!(res.scheduled[1].priority, Priority::High);
        // Move: second arrival - 10 min buffer - 10 min lead
        assert_eq!(
            res.scheduled[2].scheduled_at,
            second_arrival - 20 * MINUTE_MILLIS
        );
    }

    #[tokio::test]
    async fn single_stop_course_gets_no_move_notification() {
        let TestContext {
            ctx,
            preferences,
            user_id,
        } = setup();
        preferences.set(settings_without_personalization(&user_id));

        let course_day = Utc.ymd(2021, 6, 9).and_hms(0, 0, 0).timestamp_millis();
        let course = course_on(
            course_day,
            &user_id,
            vec![stop("museum", course_day + 10 * 3_600_000)],
        );

        let res = execute(ScheduleCourseNotificationsUseCase { course }, &ctx)
            .await
            .unwrap();
        assert_eq!(res.total_scheduled, 2);
        assert!(res
            .scheduled
            .iter()
            .all(|n| n.kind != NotificationKind::Move));
    }

    #[tokio::test]
    async fn disabled_notifications_return_an_empty_result() {
        let TestContext {
            ctx,
            preferences,
            user_id,
        } = setup();
        let mut settings = settings_without_personalization(&user_id);
        settings.enabled = false;
        preferences.set(settings);

        let course_day = Utc.ymd(2021, 6, 9).and_hms(0, 0, 0).timestamp_millis();
        let course = course_on(
            course_day,
            &user_id,
            vec![stop("museum", course_day + 10 * 3_600_000)],
        );

        let res = execute(ScheduleCourseNotificationsUseCase { course }, &ctx)
            .await
            .unwrap();
        assert_eq!(res.total_scheduled, 0);
        assert_eq!(res.skipped, 0);
        assert!(res.scheduled.is_empty());
    }

    #[tokio::test]
    async fn unset_offsets_disable_the_corresponding_notifications() {
        let TestContext {
            ctx,
            preferences,
            user_id,
        } = setup();
        let mut settings = settings_without_personalization(&user_id);
        settings.offsets.day_before_hour = None;
        settings.offsets.move_lead_min = None;
        preferences.set(settings);

        let course_day = Utc.ymd(2021, 6, 9).and_hms(0, 0, 0).timestamp_millis();
        let course = course_on(
            course_day,
            &user_id,
            vec![
                stop("museum", course_day + 10 * 3_600_000),
                stop("park", course_day + 14 * 3_600_000),
            ],
        );

        let res = execute(ScheduleCourseNotificationsUseCase { course }, &ctx)
            .await
            .unwrap();
        assert_eq!(res.total_scheduled, 1);
        assert_eq!(res.scheduled[0].kind, NotificationKind::Departure);
    }

    #[tokio::test]
    async fn quiet_hours_defer_the_preparation_reminder() {
        let TestContext {
            ctx,
            preferences,
            user_id,
        } = setup();
        let mut settings = settings_without_personalization(&user_id);
        settings.offsets.day_before_hour = Some(23);
        settings.quiet_hours = Some(QuietHours::every_day(
            NaiveTime::from_hms(22, 0, 0),
            NaiveTime::from_hms(8, 0, 0),
        ));
        preferences.set(settings);

        let course_day = Utc.ymd(2021, 6, 9).and_hms(0, 0, 0).timestamp_millis();
        let course = course_on(
            course_day,
            &user_id,
            vec![stop("museum", course_day + 10 * 3_600_000)],
        );

        let res = execute(ScheduleCourseNotificationsUseCase { course }, &ctx)
            .await
            .unwrap();
        let preparation = res
            .scheduled
            .iter()
            .find(|n| n.kind == NotificationKind::Preparation)
            .unwrap();
        // 23:00 the day before falls inside 22:00-08:00, so the
        // reminder moves to 08:00 on the course day
        assert_eq!(preparation.scheduled_at, course_day + 8 * 3_600_000);
    }

    #[tokio::test]
    async fn candidates_in_the_past_are_skipped_not_errors() {
        let TestContext {
            ctx,
            preferences,
            user_id,
        } = setup();
        preferences.set(settings_without_personalization(&user_id));

        // Course tomorrow, but so early that the departure and move
        // candidates land before "now"
        let course_day = Utc.ymd(2021, 6, 8).and_hms(0, 0, 0).timestamp_millis();
        let course = course_on(
            course_day,
            &user_id,
            vec![stop("museum", now_millis() - 3_600_000)],
        );

        let res = execute(ScheduleCourseNotificationsUseCase { course }, &ctx)
            .await
            .unwrap();
        assert_eq!(res.skipped, 1);
        assert!(res
            .scheduled
            .iter()
            .all(|n| n.kind != NotificationKind::Departure));
    }
}
