use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    /// Entries older than this are considered stale or corrupt and
    /// are purged from the delay queue by the cleanup job. No
    /// legitimate delay window comes close to this age.
    pub delay_queue_max_age_hours: i64,
    /// How often the delivery poll drains ready entries, in seconds
    pub delivery_poll_interval_secs: u64,
    /// Base url of the external travel time service. When unset the
    /// static fallback estimate is used.
    pub travel_time_api_url: Option<String>,
    /// Minutes assumed per leg when the travel time service is
    /// unavailable
    pub default_travel_time_min: i64,
}

impl Config {
    pub fn new() -> Self {
        let delay_queue_max_age_hours = read_numeric("DELAY_QUEUE_MAX_AGE_HOURS", 48);
        let delivery_poll_interval_secs =
            read_numeric("DELIVERY_POLL_INTERVAL_SECS", 60) as u64;
        let default_travel_time_min = read_numeric("DEFAULT_TRAVEL_TIME_MIN", 30);
        let travel_time_api_url = std::env::var("TRAVEL_TIME_API_URL").ok();

        Self {
            delay_queue_max_age_hours,
            delivery_poll_interval_secs,
            travel_time_api_url,
            default_travel_time_min,
        }
    }
}

fn read_numeric(var: &str, default: i64) -> i64 {
    match std::env::var(var) {
        Ok(value) => match value.parse::<i64>() {
            Ok(value) if value > 0 => value,
            _ => {
                warn!(
                    "The given {}: {} is not valid, falling back to the default: {}.",
                    var, value, default
                );
                default
            }
        },
        Err(_) => default,
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
