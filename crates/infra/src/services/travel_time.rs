use serde::Deserialize;
use tracing::warn;

/// Estimates how many minutes the user needs to get to a place by a
/// given arrival time.
#[async_trait::async_trait]
pub trait ITravelTimeCalculator: Send + Sync {
    async fn calculate(&self, place_id: &str, arrival_at: i64) -> anyhow::Result<i64>;
}

/// Fixed estimate used in tests and as the fallback when no travel
/// time service is configured.
pub struct StaticTravelTimeCalculator {
    pub minutes: i64,
}

#[async_trait::async_trait]
impl ITravelTimeCalculator for StaticTravelTimeCalculator {
    async fn calculate(&self, _place_id: &str, _arrival_at: i64) -> anyhow::Result<i64> {
        Ok(self.minutes)
    }
}

#[derive(Debug, Deserialize)]
struct TravelTimeResponse {
    minutes: i64,
}

/// Client for the external travel time service. Falls back to the
/// static default estimate when the service is unreachable, so a
/// flaky maps backend never blocks departure notifications.
pub struct HttpTravelTimeCalculator {
    base_url: String,
    fallback_minutes: i64,
    client: reqwest::Client,
}

impl HttpTravelTimeCalculator {
    pub fn new(base_url: String, fallback_minutes: i64) -> Self {
        Self {
            base_url,
            fallback_minutes,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl ITravelTimeCalculator for HttpTravelTimeCalculator {
    async fn calculate(&self, place_id: &str, arrival_at: i64) -> anyhow::Result<i64> {
        let url = format!(
            "{}/travel-time?place_id={}&arrival_at={}",
            self.base_url, place_id, arrival_at
        );
        let response = self.client.get(&url).send().await;
        match response {
            Ok(res) => {
                let body = res.json::<TravelTimeResponse>().await?;
                Ok(body.minutes)
            }
            Err(e) => {
                warn!(
                    "Travel time service unreachable, using fallback of {} min: {:?}",
                    self.fallback_minutes, e
                );
                Ok(self.fallback_minutes)
            }
        }
    }
}
