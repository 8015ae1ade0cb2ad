//! Wire types for upstream resources and their normalized dashboard forms.
//!
//! The upstream sends money as decimal strings (sometimes empty) and
//! orders with an open-ended `meta_data` list this gateway shares with
//! the platform and its plugins.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storedeck_core::{CategoryId, DisplayStatus, OrderId, OrderStatus, ProductId};

/// One `{key, value}` pair from an order's extensible metadata list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub key: String,
    pub value: serde_json::Value,
}

/// Product image reference.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Image {
    #[serde(default)]
    pub src: String,
}

/// Physical dimensions as the upstream sends them (free-form strings).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Dimensions {
    #[serde(default)]
    pub length: String,
    #[serde(default)]
    pub width: String,
    #[serde(default)]
    pub height: String,
}

/// Category reference embedded in a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: CategoryId,
    pub name: String,
}

/// Upstream product resource (mirrored, never originated here).
#[derive(Debug, Clone, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub stock_quantity: Option<i64>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub categories: Vec<CategoryRef>,
    #[serde(default)]
    pub weight: String,
    #[serde(default)]
    pub dimensions: Dimensions,
    #[serde(default, deserialize_with = "money::deserialize_opt")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub sku: String,
}

/// Normalized product shape returned to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub stock: i64,
    pub image: String,
    pub categories: Vec<String>,
    pub weight: String,
    pub dimensions: Dimensions,
    pub price: Decimal,
    pub ean: String,
}

impl From<Product> for ProductSummary {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            stock: p.stock_quantity.unwrap_or(0),
            image: p.images.into_iter().next().unwrap_or_default().src,
            categories: p.categories.into_iter().map(|c| c.name).collect(),
            weight: p.weight,
            dimensions: p.dimensions,
            price: p.price.unwrap_or_default(),
            ean: p.sku,
        }
    }
}

/// Billing/shipping address block.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Address {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub address_1: String,
    #[serde(default)]
    pub address_2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postcode: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

/// One order line item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub product_id: ProductId,
    #[serde(default)]
    pub name: String,
    pub quantity: i64,
    #[serde(default, deserialize_with = "money::deserialize_opt")]
    pub price: Option<Decimal>,
}

/// Upstream order resource.
#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Raw wire status; plugins can introduce values outside the known set.
    pub status: String,
    #[serde(default, deserialize_with = "money::deserialize_opt")]
    pub total: Option<Decimal>,
    #[serde(default)]
    pub date_created: Option<NaiveDateTime>,
    #[serde(default)]
    pub billing: Address,
    #[serde(default)]
    pub shipping: Address,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub meta_data: Vec<MetaData>,
}

impl Order {
    /// Parsed canonical status; unknown wire values degrade to pending.
    #[must_use]
    pub fn canonical_status(&self) -> OrderStatus {
        OrderStatus::from_upstream(&self.status).unwrap_or_default()
    }
}

/// Normalized order shape returned to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub status: OrderStatus,
    pub display_status: DisplayStatus,
    pub total: Decimal,
    #[serde(default)]
    pub date_created: Option<NaiveDateTime>,
    pub billing: Address,
    pub shipping: Address,
    pub line_items: Vec<LineItem>,
}

impl From<Order> for OrderSummary {
    fn from(o: Order) -> Self {
        let status = o.canonical_status();
        Self {
            id: o.id,
            status,
            display_status: status.display_status(),
            total: o.total.unwrap_or_default(),
            date_created: o.date_created,
            billing: o.billing,
            shipping: o.shipping,
            line_items: o.line_items,
        }
    }
}

/// Product category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub parent: i64,
}

/// Shipping method as the upstream reports it. Either title field may be
/// present depending on the endpoint variant.
#[derive(Debug, Clone, Deserialize)]
pub struct ShippingMethod {
    pub id: serde_json::Value,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub method_title: Option<String>,
}

impl ShippingMethod {
    /// Carrier display name: `method_title`, else `title`, else the id.
    #[must_use]
    pub fn carrier_name(&self) -> String {
        self.method_title
            .clone()
            .or_else(|| self.title.clone())
            .unwrap_or_else(|| match &self.id {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
    }
}

/// A note attached to an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderNote {
    pub id: i64,
    pub note: String,
    #[serde(default)]
    pub date_created: Option<NaiveDateTime>,
}

/// Serde helpers for upstream money fields: decimal strings, with the
/// empty string meaning "not set".
pub(crate) mod money {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        match raw {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(serde_json::Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(serde_json::Value::String(s)) => s
                .trim()
                .parse::<Decimal>()
                .map(Some)
                .map_err(serde::de::Error::custom),
            Some(serde_json::Value::Number(n)) => n
                .to_string()
                .parse::<Decimal>()
                .map(Some)
                .map_err(serde::de::Error::custom),
            Some(other) => Err(serde::de::Error::custom(format!(
                "expected decimal string, got {other}"
            ))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_product_normalization() {
        let product: Product = serde_json::from_value(json!({
            "id": 11,
            "name": "Widget",
            "stock_quantity": 4,
            "images": [{"src": "https://img.example.com/widget.jpg"}],
            "categories": [{"id": 1, "name": "Demo"}],
            "weight": "0.5",
            "dimensions": {"length": "10", "width": "4", "height": "2"},
            "price": "19.99",
            "sku": "4006381333931"
        }))
        .unwrap();

        let summary = ProductSummary::from(product);
        assert_eq!(summary.stock, 4);
        assert_eq!(summary.image, "https://img.example.com/widget.jpg");
        assert_eq!(summary.categories, vec!["Demo".to_string()]);
        assert_eq!(summary.price.to_string(), "19.99");
        assert_eq!(summary.ean, "4006381333931");
    }

    #[test]
    fn test_empty_price_is_none() {
        let product: Product =
            serde_json::from_value(json!({"id": 1, "name": "X", "price": ""})).unwrap();
        assert!(product.price.is_none());
        assert_eq!(ProductSummary::from(product).price, Decimal::ZERO);
    }

    #[test]
    fn test_order_status_degrades_unknown() {
        let order: Order = serde_json::from_value(json!({
            "id": 5,
            "status": "checkout-draft",
            "total": "100.00"
        }))
        .unwrap();
        assert_eq!(order.canonical_status(), OrderStatus::Pending);
    }

    #[test]
    fn test_order_summary_display_status() {
        let order: Order = serde_json::from_value(json!({
            "id": 8,
            "status": "completed",
            "total": "200.00",
            "date_created": "2026-03-22T16:28:02"
        }))
        .unwrap();
        let summary = OrderSummary::from(order);
        assert_eq!(summary.display_status, DisplayStatus::Shipped);
        assert_eq!(summary.total.to_string(), "200.00");
        assert!(summary.date_created.is_some());
    }

    #[test]
    fn test_order_metadata_round_trips_unknown_keys() {
        let order: Order = serde_json::from_value(json!({
            "id": 1,
            "status": "processing",
            "meta_data": [
                {"id": 9, "key": "tracking_info", "value": "[]"},
                {"key": "_other", "value": {"x": 1}}
            ]
        }))
        .unwrap();
        assert_eq!(order.meta_data.len(), 2);
        assert_eq!(order.meta_data[0].key, "tracking_info");
        assert!(order.meta_data[1].id.is_none());
    }

    #[test]
    fn test_carrier_name_fallback_chain() {
        let m: ShippingMethod =
            serde_json::from_value(json!({"id": "flat_rate", "method_title": "Flat rate"}))
                .unwrap();
        assert_eq!(m.carrier_name(), "Flat rate");

        let m: ShippingMethod =
            serde_json::from_value(json!({"id": "local_pickup", "title": "Local pickup"})).unwrap();
        assert_eq!(m.carrier_name(), "Local pickup");

        let m: ShippingMethod = serde_json::from_value(json!({"id": "dhl"})).unwrap();
        assert_eq!(m.carrier_name(), "dhl");
    }
}
