pub mod cancel_notification;
pub mod cleanup_delay_queue;
pub mod get_ready_notifications;
pub mod schedule_batch;
pub mod schedule_course_notifications;
pub mod schedule_notification;
