use crate::shared::entity::{Entity, ID};
use serde::{Deserialize, Serialize};

/// Minutes reserved for wrapping up at a stop before moving on to the
/// next one.
pub const INTRA_STOP_BUFFER_MIN: i64 = 10;

/// One stop of a planned outing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseStop {
    pub place_id: String,
    pub name: String,
    /// When the user plans to arrive, unix millis
    pub arrival_at: i64,
}

/// A planned outing: an ordered list of stops on a given day. This is
/// the domain event the scheduling engine derives notifications from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: ID,
    pub user_id: ID,
    pub title: String,
    /// Midnight (user-local) of the day the course takes place, unix millis
    pub date: i64,
    pub stops: Vec<CourseStop>,
}

impl Course {
    pub fn first_stop(&self) -> Option<&CourseStop> {
        self.stops.first()
    }

    pub fn second_stop(&self) -> Option<&CourseStop> {
        self.stops.get(1)
    }
}

impl Entity for Course {
    fn id(&self) -> &ID {
        &self.id
    }
}
