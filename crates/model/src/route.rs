use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::id::Id;

use crate::{location::Location, supplier::Supplier};

/// One location visited as part of a route.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub sequence_index: usize,
    /// Absent for the project origin.
    pub supplier_id: Option<Id<Supplier>>,
    pub name: String,
    pub location: Location,
    /// Meters from the previous stop; absent for the origin and for legs
    /// whose cost is unknown.
    pub distance_from_previous: Option<f64>,
    /// Seconds from the previous stop.
    pub duration_from_previous: Option<f64>,
}

impl Stop {
    pub fn is_origin(&self) -> bool {
        self.sequence_index == 0
    }
}

/// The result of one optimization call. Never persisted.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub stops: Vec<Stop>,
    pub total_distance_meters: f64,
    pub total_duration_seconds: f64,
    /// Legs without a known cost. They do not contribute to the totals.
    #[serde(default)]
    pub unknown_legs: usize,
    #[serde(default)]
    pub optimal: bool,
    #[serde(default)]
    pub returns_to_origin: bool,
    /// Leg from the last stop back to the origin, when the route is closed.
    pub return_distance_meters: Option<f64>,
    pub return_duration_seconds: Option<f64>,
    pub computed_at: DateTime<Utc>,
}

impl Route {
    pub fn origin(&self) -> Option<&Stop> {
        self.stops.first()
    }

    pub fn supplier_stops(&self) -> &[Stop] {
        self.stops.get(1..).unwrap_or_default()
    }

    pub fn total_distance_km(&self) -> f64 {
        self.total_distance_meters / 1000.0
    }
}
