//! PrestaShop 1.7+ WebService adapter.
//!
//! Tested against the 1.7.x JSON API; newer versions (1.8+, 8.x) may need
//! adjustments.

use crate::adapter::{AdapterError, EcommerceAdapter};
use crate::product::Product;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

pub struct PrestaShopAdapter {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl PrestaShopAdapter {
    /// Create an adapter for one shop. `base_url` is the store root, e.g.
    /// `https://your-store.com`.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, AdapterError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("similar-products/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        })
    }

    async fn get_json(&self, url: &str, params: &[(&str, &str)]) -> Result<Value, AdapterError> {
        let response = self
            .client
            .get(url)
            .query(&[("ws_key", self.api_key.as_str()), ("output_format", "JSON")])
            .query(params)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    /// Parse one PrestaShop product entry into the universal representation.
    /// Returns `None` for entries missing an id or a usable name.
    fn parse_product(data: &Value) -> Option<Product> {
        let obj = data.as_object()?;

        let id = match obj.get("id") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return None,
        };

        // Multi-language name: language id "1" is the shop's primary
        // language, "2" the secondary.
        let name_field = obj.get("name");
        let mut name = name_field
            .map(|field| extract_multilang_field(field, Some("1")))
            .unwrap_or_default();
        // A plain-string name carries no second language.
        let name_secondary = match name_field {
            Some(field @ Value::Array(_)) => extract_multilang_field(field, Some("2")),
            _ => String::new(),
        };
        if name.is_empty() {
            if let Some(field) = name_field {
                name = extract_multilang_field(field, None);
            }
        }
        if name.is_empty() {
            return None;
        }

        let category_id = match obj.get("id_category_default") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };

        // Stock may be inlined, or nested under associations when the
        // product was fetched with display=full.
        let quantity = obj
            .get("associations")
            .and_then(|a| a.get("stock_availables"))
            .and_then(|s| s.as_array())
            .and_then(|s| s.first())
            .and_then(|s| s.get("quantity"))
            .or_else(|| obj.get("quantity"))
            .map(parse_int)
            .unwrap_or(0);

        let price = obj.get("price").and_then(parse_float).filter(|p| *p > 0.0);

        let manufacturer_name = match obj.get("manufacturer_name") {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            _ => None,
        };

        let sku = match obj.get("reference") {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            _ => None,
        };

        Some(Product {
            id,
            name,
            name_secondary: (!name_secondary.is_empty()).then_some(name_secondary),
            category_id,
            quantity,
            price,
            manufacturer_name,
            sku,
        })
    }
}

/// Extract a value from a PrestaShop multi-language field, which may be a
/// plain string, an array of `{"id": …, "value": …}` entries, or an object
/// with a `value` key.
fn extract_multilang_field(field: &Value, lang_id: Option<&str>) -> String {
    match field {
        Value::String(s) => s.clone(),
        Value::Array(entries) => {
            if let Some(wanted) = lang_id {
                for entry in entries {
                    let id = match entry.get("id") {
                        Some(Value::String(s)) => s.clone(),
                        Some(Value::Number(n)) => n.to_string(),
                        _ => continue,
                    };
                    if id == wanted {
                        return entry
                            .get("value")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string();
                    }
                }
                String::new()
            } else {
                entries
                    .first()
                    .and_then(|e| e.get("value"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            }
        }
        Value::Object(map) => map
            .get("value")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

/// PrestaShop serializes numbers inconsistently; accept both forms.
fn parse_int(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n.as_i64().unwrap_or(0),
        Value::String(s) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

fn parse_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[async_trait]
impl EcommerceAdapter for PrestaShopAdapter {
    async fn get_product(&self, product_id: &str) -> Result<Option<Product>, AdapterError> {
        let url = format!("{}/api/products/{}", self.base_url, product_id);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("ws_key", self.api_key.as_str()),
                ("output_format", "JSON"),
                ("display", "full"),
            ])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let data: Value = response.error_for_status()?.json().await?;

        // The API returns either {"product": {…}} or {"products": [{…}]}
        // depending on authentication method and parameters.
        if let Some(product) = data.get("product") {
            return Ok(Self::parse_product(product));
        }
        if let Some(first) = data.get("products").and_then(|p| p.as_array()).and_then(|p| p.first()) {
            return Ok(Self::parse_product(first));
        }

        Ok(None)
    }

    async fn get_products_by_category(
        &self,
        category_id: &str,
        limit: usize,
    ) -> Result<Vec<Product>, AdapterError> {
        let url = format!("{}/api/products", self.base_url);

        // Step 1: product ids in the category.
        let limit_str = limit.to_string();
        let category_filter = format!("[{}]", category_id);
        let data = self
            .get_json(
                &url,
                &[
                    ("filter[id_category_default]", category_filter.as_str()),
                    ("limit", limit_str.as_str()),
                ],
            )
            .await?;

        let product_ids: Vec<String> = data
            .get("products")
            .and_then(|p| p.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| match item.get("id") {
                        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
                        Some(Value::Number(n)) => Some(n.to_string()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        if product_ids.is_empty() {
            return Ok(Vec::new());
        }

        // Step 2: batch fetch the fields scoring needs.
        let ids_filter = format!("[{}]", product_ids.join("|"));
        let data = self
            .get_json(
                &url,
                &[
                    ("filter[id]", ids_filter.as_str()),
                    ("display", "[id,name,id_category_default,price,manufacturer_name]"),
                ],
            )
            .await?;

        // Keep response order: it is the pool order ties fall back to.
        let mut products: Vec<Product> = Vec::new();
        let mut by_id: HashMap<String, usize> = HashMap::new();
        if let Some(items) = data.get("products").and_then(|p| p.as_array()) {
            for item in items {
                if let Some(product) = Self::parse_product(item) {
                    if by_id.contains_key(&product.id) {
                        continue;
                    }
                    by_id.insert(product.id.clone(), products.len());
                    products.push(product);
                }
            }
        }

        // Step 3: stock lives in its own endpoint when not inlined.
        let stock_url = format!("{}/api/stock_availables", self.base_url);
        let stock_data = self
            .get_json(
                &stock_url,
                &[
                    ("filter[id_product]", ids_filter.as_str()),
                    ("display", "[id_product,quantity]"),
                ],
            )
            .await?;

        if let Some(items) = stock_data.get("stock_availables").and_then(|s| s.as_array()) {
            for item in items {
                let product_id = match item.get("id_product") {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Number(n)) => n.to_string(),
                    _ => continue,
                };
                if let Some(&idx) = by_id.get(&product_id) {
                    products[idx].quantity = item.get("quantity").map(parse_int).unwrap_or(0);
                }
            }
        }

        Ok(products)
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/api", self.base_url);
        match self.client.head(&url).send().await {
            // 401 means the API answered but wants credentials on HEAD.
            Ok(response) => {
                let status = response.status();
                status == reqwest::StatusCode::OK || status == reqwest::StatusCode::UNAUTHORIZED
            }
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_product_with_multilang_names() {
        let data = json!({
            "id": 4422,
            "name": [
                {"id": "1", "value": "Ciastka bezglutenowe"},
                {"id": "2", "value": "Gluten-Free Cookies"}
            ],
            "id_category_default": "5",
            "price": "24.99",
            "manufacturer_name": "Bakeline",
            "quantity": "12"
        });

        let product = PrestaShopAdapter::parse_product(&data).unwrap();
        assert_eq!(product.id, "4422");
        assert_eq!(product.name, "Ciastka bezglutenowe");
        assert_eq!(product.name_secondary.as_deref(), Some("Gluten-Free Cookies"));
        assert_eq!(product.category_id, "5");
        assert_eq!(product.price, Some(24.99));
        assert_eq!(product.manufacturer_name.as_deref(), Some("Bakeline"));
        assert_eq!(product.quantity, 12);
    }

    #[test]
    fn test_parse_product_plain_string_name() {
        let data = json!({
            "id": "7",
            "name": "Oat Cookies",
            "id_category_default": 5,
            "price": 9.5
        });

        let product = PrestaShopAdapter::parse_product(&data).unwrap();
        assert_eq!(product.name, "Oat Cookies");
        assert!(product.name_secondary.is_none());
        assert_eq!(product.category_id, "5");
        assert_eq!(product.price, Some(9.5));
        assert_eq!(product.quantity, 0);
    }

    #[test]
    fn test_parse_product_stock_from_associations() {
        let data = json!({
            "id": "7",
            "name": "Oat Cookies",
            "associations": {
                "stock_availables": [{"id": "3", "quantity": "8"}]
            }
        });

        let product = PrestaShopAdapter::parse_product(&data).unwrap();
        assert_eq!(product.quantity, 8);
    }

    #[test]
    fn test_parse_product_rejects_missing_id_or_name() {
        assert!(PrestaShopAdapter::parse_product(&json!({"name": "No Id"})).is_none());
        assert!(PrestaShopAdapter::parse_product(&json!({"id": "1"})).is_none());
        assert!(PrestaShopAdapter::parse_product(&json!({"id": "1", "name": ""})).is_none());
    }

    #[test]
    fn test_extract_multilang_falls_back_to_first_language() {
        let field = json!([{"id": "9", "value": "Only Language"}]);
        assert_eq!(extract_multilang_field(&field, Some("1")), "");
        assert_eq!(extract_multilang_field(&field, None), "Only Language");

        let wrapped = json!({"language": [], "value": "Wrapped"});
        assert_eq!(extract_multilang_field(&wrapped, None), "Wrapped");
    }

    #[test]
    fn test_parse_product_ignores_zero_price() {
        let data = json!({"id": "1", "name": "Freebie", "price": "0"});
        let product = PrestaShopAdapter::parse_product(&data).unwrap();
        assert!(product.price.is_none());
    }
}
