use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemSupplier {
    pub name: Option<String>,
    pub location: Option<String>,
    pub price: Option<f64>,
}

/// One line of a bill of materials.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(alias = "plantName")]
    pub name: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    pub selected_supplier: Option<ItemSupplier>,
}

fn default_quantity() -> u32 {
    1
}

impl OrderItem {
    pub fn line_total(&self) -> f64 {
        let price = self
            .selected_supplier
            .as_ref()
            .and_then(|supplier| supplier.price)
            .unwrap_or(0.0);
        price * f64::from(self.quantity)
    }

    pub fn supplier_location(&self) -> Option<&str> {
        self.selected_supplier
            .as_ref()
            .and_then(|supplier| supplier.location.as_deref())
            .map(str::trim)
            .filter(|location| !location.is_empty())
    }
}

/// Order data the route explainer talks about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderContext {
    #[serde(default)]
    pub total_price: f64,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    /// Items grouped by supplier location, in the order the frontend listed
    /// them. Derived from `items` when the frontend leaves it out.
    #[serde(default)]
    pub location_groups: IndexMap<String, Vec<OrderItem>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationSummary {
    pub location: String,
    pub item_count: usize,
    pub total_value: f64,
}

impl OrderContext {
    pub fn plant_count(&self) -> u64 {
        self.items
            .iter()
            .fold(0u64, |total, item| total.saturating_add(u64::from(item.quantity)))
    }

    pub fn location_summaries(&self) -> Vec<LocationSummary> {
        let summarize = |location: &str, items: &[&OrderItem]| LocationSummary {
            location: location.to_owned(),
            item_count: items.len(),
            total_value: items.iter().map(|item| item.line_total()).sum(),
        };

        if !self.location_groups.is_empty() {
            return self
                .location_groups
                .iter()
                .map(|(location, items)| {
                    summarize(location, &items.iter().collect::<Vec<_>>())
                })
                .collect();
        }

        let mut groups: IndexMap<&str, Vec<&OrderItem>> = IndexMap::new();
        for item in &self.items {
            if let Some(location) = item.supplier_location() {
                groups.entry(location).or_default().push(item);
            }
        }
        groups
            .iter()
            .map(|(location, items)| summarize(*location, items))
            .collect()
    }
}
