use serde::{Deserialize, Serialize};

/// Transient conditions shift deliveries at most this many minutes.
pub const MAX_ADVANCE_MIN: i64 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Clear,
    Mild,
    Adverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficLevel {
    Normal,
    Moderate,
    Heavy,
    Severe,
}

/// Snapshot of the conditions around the user's route at prediction
/// time. Supplied by an external context service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealTimeConditions {
    pub weather: WeatherCondition,
    pub traffic: TrafficLevel,
    /// Category of a nearby public event, e.g. "concert" or "marathon"
    pub public_event: Option<String>,
    pub road_closures: bool,
    pub transport_disruption: bool,
}

impl Default for RealTimeConditions {
    fn default() -> Self {
        Self {
            weather: WeatherCondition::Clear,
            traffic: TrafficLevel::Normal,
            public_event: None,
            road_closures: false,
            transport_disruption: false,
        }
    }
}

impl RealTimeConditions {
    /// How many minutes earlier a notification should fire given the
    /// current conditions. Additive over all factors, capped at
    /// `MAX_ADVANCE_MIN`.
    pub fn recommended_advance_min(&self) -> i64 {
        let mut advance = 0;
        advance += match self.weather {
            WeatherCondition::Clear => 0,
            WeatherCondition::Mild => 15,
            WeatherCondition::Adverse => 30,
        };
        advance += match self.traffic {
            TrafficLevel::Normal => 0,
            TrafficLevel::Moderate => 10,
            TrafficLevel::Heavy => 20,
            TrafficLevel::Severe => 30,
        };
        if let Some(category) = &self.public_event {
            advance += public_event_advance_min(category);
        }
        if self.road_closures {
            advance += 25;
        }
        if self.transport_disruption {
            advance += 35;
        }
        advance.min(MAX_ADVANCE_MIN)
    }

    /// The single factor contributing the most minutes, for the
    /// prediction's reasoning trace.
    pub fn dominant_factor(&self) -> Option<&'static str> {
        let weather = match self.weather {
            WeatherCondition::Clear => 0,
            WeatherCondition::Mild => 15,
            WeatherCondition::Adverse => 30,
        };
        let traffic = match self.traffic {
            TrafficLevel::Normal => 0,
            TrafficLevel::Moderate => 10,
            TrafficLevel::Heavy => 20,
            TrafficLevel::Severe => 30,
        };
        let event = self
            .public_event
            .as_ref()
            .map(|c| public_event_advance_min(c))
            .unwrap_or(0);
        let closures = if self.road_closures { 25 } else { 0 };
        let disruption = if self.transport_disruption { 35 } else { 0 };

        let factors = [
            ("weather", weather),
            ("traffic", traffic),
            ("public_event", event),
            ("road_closures", closures),
            ("transport_disruption", disruption),
        ];
        factors
            .iter()
            .filter(|(_, minutes)| *minutes > 0)
            .max_by_key(|(_, minutes)| *minutes)
            .map(|(name, _)| *name)
    }
}

/// Large crowd events move people earlier than disruptive but local
/// ones.
fn public_event_advance_min(category: &str) -> i64 {
    let category = category.to_lowercase();
    if category.contains("concert") || category.contains("festival") {
        35
    } else if category.contains("protest") || category.contains("marathon") {
        25
    } else {
        15
    }
}
