//! Degraded reads: canned payloads served when the upstream is down.
//!
//! Read endpoints never surface an upstream outage to the presentation
//! layer; they serve a fixed fallback payload instead. The tagged
//! [`Sourced`] type keeps "upstream is fine" distinguishable from "we are
//! serving canned data" inside the gateway and its tests, even though the
//! HTTP response stays success-shaped either way. Write paths never come
//! through here; masking a failed write as success would corrupt tenant
//! expectations.

use rust_decimal::Decimal;
use storedeck_core::{CategoryId, OrderId, OrderStatus, ProductId};

use crate::upstream::UpstreamError;
use crate::upstream::types::{Category, OrderSummary, ProductSummary};

/// Where a read payload came from.
#[derive(Debug)]
pub enum Sourced<T> {
    /// Fresh data from the upstream.
    Live(T),
    /// Canned substitute; the cause is kept for logging and tests.
    Fallback { data: T, cause: UpstreamError },
}

impl<T> Sourced<T> {
    /// The payload, wherever it came from.
    pub fn into_inner(self) -> T {
        match self {
            Self::Live(data) | Self::Fallback { data, .. } => data,
        }
    }

    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Apply the read-path degradation policy: upstream failures become
/// fallback data, configuration errors still propagate (a misconfigured
/// store is the tenant's problem to fix, not an outage to paper over).
///
/// # Errors
///
/// Returns the original [`UpstreamError`] only when it is a
/// configuration error.
pub fn or_fallback<T>(
    result: Result<T, UpstreamError>,
    fallback: impl FnOnce() -> T,
) -> Result<Sourced<T>, UpstreamError> {
    match result {
        Ok(data) => Ok(Sourced::Live(data)),
        Err(e) if e.is_config() => Err(e),
        Err(cause) => {
            tracing::warn!(error = %cause, "upstream read failed, serving fallback data");
            Ok(Sourced::Fallback {
                data: fallback(),
                cause,
            })
        }
    }
}

/// Fixed sample products served when the upstream cannot be reached.
#[must_use]
pub fn products() -> Vec<ProductSummary> {
    vec![
        sample_product(1, "Example Product 1", 10),
        sample_product(2, "Example Product 2", 5),
    ]
}

/// Fixed sample orders.
#[must_use]
pub fn orders() -> Vec<OrderSummary> {
    vec![
        sample_order(1, OrderStatus::Pending, Decimal::new(100, 0)),
        sample_order(2, OrderStatus::Completed, Decimal::new(200, 0)),
    ]
}

/// Fixed sample categories.
#[must_use]
pub fn categories() -> Vec<Category> {
    vec![
        Category {
            id: CategoryId::new(1),
            name: "Demo".to_string(),
            parent: 0,
        },
        Category {
            id: CategoryId::new(2),
            name: "Example".to_string(),
            parent: 0,
        },
        Category {
            id: CategoryId::new(3),
            name: "Child of Demo".to_string(),
            parent: 1,
        },
    ]
}

fn sample_product(id: i64, name: &str, stock: i64) -> ProductSummary {
    ProductSummary {
        id: ProductId::new(id),
        name: name.to_string(),
        stock,
        image: String::new(),
        categories: Vec::new(),
        weight: String::new(),
        dimensions: crate::upstream::types::Dimensions::default(),
        price: Decimal::ZERO,
        ean: String::new(),
    }
}

fn sample_order(id: i64, status: OrderStatus, total: Decimal) -> OrderSummary {
    OrderSummary {
        id: OrderId::new(id),
        status,
        display_status: status.display_status(),
        total,
        date_created: None,
        billing: crate::upstream::types::Address::default(),
        shipping: crate::upstream::types::Address::default(),
        line_items: Vec::new(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_live_passes_through() {
        let sourced = or_fallback(Ok(vec![1, 2, 3]), Vec::new).unwrap();
        assert!(!sourced.is_degraded());
        assert_eq!(sourced.into_inner(), vec![1, 2, 3]);
    }

    #[test]
    fn test_upstream_failure_degrades() {
        let err = UpstreamError::Status {
            status: 500,
            body: String::new(),
        };
        let sourced = or_fallback(Err(err), || vec![9]).unwrap();
        assert!(sourced.is_degraded());
        assert_eq!(sourced.into_inner(), vec![9]);
    }

    #[test]
    fn test_config_error_still_propagates() {
        let err = UpstreamError::Config("API secret");
        let result = or_fallback::<Vec<i32>>(Err(err), Vec::new);
        assert!(result.unwrap_err().is_config());
    }

    #[test]
    fn test_fallback_payloads_match_samples() {
        let products = products();
        assert_eq!(products.len(), 2);
        assert_eq!(products.first().unwrap().stock, 10);

        let orders = orders();
        assert_eq!(orders.last().unwrap().total, Decimal::new(200, 0));

        assert_eq!(categories().len(), 3);
    }
}
