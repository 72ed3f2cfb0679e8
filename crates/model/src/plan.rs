use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utility::id::Id;

use crate::{location::Location, route::Route, supplier::Supplier};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectLocation {
    pub address: String,
    pub location: Location,
}

/// A supplier that made it into the route.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlannedSupplier {
    pub id: Option<Id<Supplier>>,
    pub name: String,
    pub location: Location,
    #[serde(default)]
    pub items: Vec<Value>,
    #[serde(default)]
    pub total_value: f64,
}

/// A supplier that was left out of the route, and why.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DroppedSupplier {
    pub id: Option<Id<Supplier>>,
    pub name: String,
    pub location: Option<String>,
    pub error: String,
}

/// Everything `/route/optimize` hands back to the frontend.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoutePlan {
    pub route: Route,
    pub project_location: ProjectLocation,
    /// Suppliers in visiting order.
    pub suppliers: Vec<PlannedSupplier>,
    #[serde(default)]
    pub failed_suppliers: Vec<DroppedSupplier>,
    pub total_distance_km: f64,
    pub estimated_hours: u32,
    /// Fuel cost in baht.
    pub fuel_cost: f64,
    pub map_url: Option<String>,
    pub reasoning: String,
}
