pub mod adapt_to_realtime_context;
pub mod analyze_user_behavior;
pub mod optimize_batch_timing;
pub mod optimize_for_engagement;
pub mod predict_optimal_timing;
pub mod predict_with_ab_testing;
pub mod update_model_feedback;

pub use predict_optimal_timing::predict_optimal_timing_with_fallback;
