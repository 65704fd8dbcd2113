use serde::{Deserialize, Serialize};

/// Product represents one catalog item as seen by the ranking engine.
///
/// Instances are built by an e-commerce adapter per request and never
/// mutated afterwards; the engine only reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    /// Primary display name (first catalog language).
    pub name: String,
    /// Second-language name, when the source shop supplies one.
    #[serde(default)]
    pub name_secondary: Option<String>,
    pub category_id: String,
    /// Stock count. Used only as a pre-filter, never scored.
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub manufacturer_name: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
}

impl Product {
    pub fn new(id: String, name: String, category_id: String) -> Self {
        Self {
            id,
            name,
            name_secondary: None,
            category_id,
            quantity: 0,
            price: None,
            manufacturer_name: None,
            sku: None,
        }
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_manufacturer(mut self, manufacturer: String) -> Self {
        self.manufacturer_name = Some(manufacturer);
        self
    }

    pub fn with_secondary_name(mut self, name: String) -> Self {
        self.name_secondary = Some(name);
        self
    }

    /// Whether the product can appear in a candidate pool.
    pub fn in_stock(&self) -> bool {
        self.quantity > 0
    }
}
