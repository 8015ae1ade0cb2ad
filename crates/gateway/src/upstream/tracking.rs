//! Shipment-tracking ledger embedded in order metadata.
//!
//! Tracking entries are not a first-class upstream resource: the whole
//! array lives JSON-encoded in a single metadata slot per order, keyed
//! [`TRACKING_META_KEY`]. Every mutation is read-modify-write of the full
//! array with no concurrency token, so two concurrent appends race and
//! the last writer wins. That is the ledger's contract (the metadata format
//! requires whole-array writes); the [`MetadataLedger`] seam is where an
//! optimistic-concurrency guard would go if the upstream ever exposes a
//! revision token.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storedeck_core::{OrderId, OrderStatus};

use super::types::MetaData;
use super::{UpstreamClient, UpstreamError};

/// Metadata key owned exclusively by this gateway.
pub const TRACKING_META_KEY: &str = "tracking_info";

/// Carrier-plugin-compatible key, surfaced read-only when the owned slot
/// is absent. Never written back.
pub const PLUGIN_META_KEY: &str = "_tracking_items";

/// One shipment-tracking entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingEntry {
    /// Client-generated unique token.
    pub id: String,
    /// Carrier/provider name.
    pub provider: String,
    pub tracking_number: String,
    pub date_shipped: String,
}

impl TrackingEntry {
    /// Create an entry with a fresh unique id.
    #[must_use]
    pub fn new(
        provider: impl Into<String>,
        tracking_number: impl Into<String>,
        date_shipped: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            provider: provider.into(),
            tracking_number: tracking_number.into(),
            date_shipped: date_shipped.into(),
        }
    }
}

/// Narrow repository interface over an order's metadata list.
///
/// `write_metadata` must apply the slot value and the optional status
/// transition in a single upstream update call.
pub trait MetadataLedger {
    /// Fetch the order's full metadata list.
    fn order_metadata(
        &self,
        order: OrderId,
    ) -> impl Future<Output = Result<Vec<MetaData>, UpstreamError>> + Send;

    /// Overwrite one metadata slot, optionally transitioning the order
    /// status in the same call.
    fn write_metadata(
        &self,
        order: OrderId,
        key: &str,
        value: serde_json::Value,
        status: Option<OrderStatus>,
    ) -> impl Future<Output = Result<(), UpstreamError>> + Send;
}

impl MetadataLedger for UpstreamClient {
    async fn order_metadata(&self, order: OrderId) -> Result<Vec<MetaData>, UpstreamError> {
        Ok(self.order(order).await?.meta_data)
    }

    async fn write_metadata(
        &self,
        order: OrderId,
        key: &str,
        value: serde_json::Value,
        status: Option<OrderStatus>,
    ) -> Result<(), UpstreamError> {
        let mut body = serde_json::json!({
            "meta_data": [{ "key": key, "value": value }],
        });
        if let Some(status) = status {
            body["status"] = serde_json::Value::String(status.as_upstream().to_owned());
        }
        self.update_order(order, &body).await.map(|_| ())
    }
}

/// Tracking-entry ledger over a [`MetadataLedger`].
pub struct TrackingLedger<'a, L: MetadataLedger> {
    ledger: &'a L,
}

impl<'a, L: MetadataLedger> TrackingLedger<'a, L> {
    #[must_use]
    pub const fn new(ledger: &'a L) -> Self {
        Self { ledger }
    }

    /// List the tracking entries recorded on an order.
    ///
    /// An absent slot or an undecodable value yields an empty list; decode
    /// failures are logged but swallowed so a corrupted slot never takes
    /// the order page down. Entries under [`PLUGIN_META_KEY`] are surfaced
    /// when the owned slot is absent.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] only when the order itself cannot be
    /// fetched.
    pub async fn list(&self, order: OrderId) -> Result<Vec<TrackingEntry>, UpstreamError> {
        let meta = self.ledger.order_metadata(order).await?;
        Ok(entries_from_metadata(&meta))
    }

    /// Append an entry, rewriting the whole array in one update call.
    /// With `mark_shipped` the same call transitions the order to
    /// [`OrderStatus::FULFILLED`].
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] if the read or the write-back fails.
    pub async fn append(
        &self,
        order: OrderId,
        entry: TrackingEntry,
        mark_shipped: bool,
    ) -> Result<(), UpstreamError> {
        let mut entries = self.owned_entries(order).await?;
        entries.push(entry);
        self.write(order, &entries, mark_shipped.then_some(OrderStatus::FULFILLED))
            .await
    }

    /// Remove the entry with `entry_id`, rewriting the filtered array.
    ///
    /// Removing an unknown id rewrites the array unchanged; the upstream
    /// has no per-entry endpoint to report absence through.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] if the read or the write-back fails.
    pub async fn remove(&self, order: OrderId, entry_id: &str) -> Result<(), UpstreamError> {
        let mut entries = self.owned_entries(order).await?;
        entries.retain(|e| e.id != entry_id);
        self.write(order, &entries, None).await
    }

    /// Read-modify-write source: only the owned slot, never the plugin
    /// key, so plugin entries are never copied into our slot on append.
    async fn owned_entries(&self, order: OrderId) -> Result<Vec<TrackingEntry>, UpstreamError> {
        let meta = self.ledger.order_metadata(order).await?;
        Ok(meta
            .iter()
            .find(|m| m.key == TRACKING_META_KEY)
            .and_then(|m| decode_entries(&m.value))
            .unwrap_or_default())
    }

    async fn write(
        &self,
        order: OrderId,
        entries: &[TrackingEntry],
        status: Option<OrderStatus>,
    ) -> Result<(), UpstreamError> {
        let encoded = serde_json::to_string(entries)
            .map_err(|e| UpstreamError::Protocol(e.to_string()))?;
        self.ledger
            .write_metadata(order, TRACKING_META_KEY, serde_json::Value::String(encoded), status)
            .await
    }
}

/// Extract tracking entries from a metadata list: the owned slot wins,
/// otherwise the plugin slot is normalized read-only.
#[must_use]
pub fn entries_from_metadata(meta: &[MetaData]) -> Vec<TrackingEntry> {
    if let Some(slot) = meta.iter().find(|m| m.key == TRACKING_META_KEY) {
        return decode_entries(&slot.value).unwrap_or_else(|| {
            tracing::warn!(key = TRACKING_META_KEY, "undecodable tracking slot, serving empty");
            Vec::new()
        });
    }

    meta.iter()
        .find(|m| m.key == PLUGIN_META_KEY)
        .map(|slot| plugin_entries(&slot.value))
        .unwrap_or_default()
}

/// Decode the owned slot. The value is a JSON-encoded string on write,
/// but a raw array is accepted too (older rows were stored unencoded).
fn decode_entries(value: &serde_json::Value) -> Option<Vec<TrackingEntry>> {
    match value {
        serde_json::Value::String(s) => serde_json::from_str(s).ok(),
        serde_json::Value::Array(_) => serde_json::from_value(value.clone()).ok(),
        _ => None,
    }
}

/// Normalize carrier-plugin rows (`tracking_id`/`tracking_provider`/...)
/// into the gateway's entry shape.
fn plugin_entries(value: &serde_json::Value) -> Vec<TrackingEntry> {
    #[derive(Deserialize)]
    struct PluginRow {
        #[serde(default)]
        tracking_id: Option<serde_json::Value>,
        #[serde(default)]
        tracking_provider: String,
        #[serde(default)]
        tracking_number: String,
        #[serde(default)]
        date_shipped: String,
    }

    let rows: Vec<PluginRow> = match value {
        serde_json::Value::String(s) => serde_json::from_str(s).unwrap_or_default(),
        serde_json::Value::Array(_) => serde_json::from_value(value.clone()).unwrap_or_default(),
        _ => Vec::new(),
    };

    rows.into_iter()
        .map(|row| {
            let id = row
                .tracking_id
                .map(|v| match v {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                })
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| row.tracking_number.clone());
            TrackingEntry {
                id,
                provider: row.tracking_provider,
                tracking_number: row.tracking_number,
                date_shipped: row.date_shipped,
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    fn entry(id: &str) -> TrackingEntry {
        TrackingEntry {
            id: id.to_string(),
            provider: "dhl".to_string(),
            tracking_number: format!("TN-{id}"),
            date_shipped: "2026-02-01".to_string(),
        }
    }

    fn slot(entries: &[TrackingEntry]) -> MetaData {
        MetaData {
            id: None,
            key: TRACKING_META_KEY.to_string(),
            value: serde_json::Value::String(serde_json::to_string(entries).unwrap()),
        }
    }

    /// Recorded write-back.
    #[derive(Debug)]
    struct Write {
        key: String,
        value: serde_json::Value,
        status: Option<OrderStatus>,
    }

    /// Fake ledger: reads always return the snapshot captured at
    /// construction, writes are recorded. Stale reads make the
    /// lost-update race deterministic.
    struct SnapshotLedger {
        snapshot: Vec<MetaData>,
        writes: Mutex<Vec<Write>>,
    }

    impl SnapshotLedger {
        fn new(snapshot: Vec<MetaData>) -> Self {
            Self {
                snapshot,
                writes: Mutex::new(Vec::new()),
            }
        }
    }

    impl MetadataLedger for SnapshotLedger {
        async fn order_metadata(&self, _order: OrderId) -> Result<Vec<MetaData>, UpstreamError> {
            Ok(self.snapshot.clone())
        }

        async fn write_metadata(
            &self,
            _order: OrderId,
            key: &str,
            value: serde_json::Value,
            status: Option<OrderStatus>,
        ) -> Result<(), UpstreamError> {
            self.writes.lock().unwrap().push(Write {
                key: key.to_string(),
                value,
                status,
            });
            Ok(())
        }
    }

    fn written_entries(write: &Write) -> Vec<TrackingEntry> {
        let serde_json::Value::String(encoded) = &write.value else {
            panic!("slot value must be a JSON-encoded string");
        };
        serde_json::from_str(encoded).unwrap()
    }

    #[tokio::test]
    async fn test_append_writes_whole_array_once() {
        let fake = SnapshotLedger::new(vec![slot(&[entry("a"), entry("b")])]);
        let ledger = TrackingLedger::new(&fake);

        ledger
            .append(OrderId::new(7), entry("e"), false)
            .await
            .unwrap();

        let writes = fake.writes.lock().unwrap();
        assert_eq!(writes.len(), 1, "append must issue exactly one update");
        let write = writes.first().unwrap();
        assert_eq!(write.key, TRACKING_META_KEY);
        assert_eq!(write.status, None);
        let entries = written_entries(write);
        assert_eq!(
            entries.iter().map(|e| e.id.as_str()).collect::<Vec<_>>(),
            vec!["a", "b", "e"]
        );
    }

    #[tokio::test]
    async fn test_append_mark_shipped_sets_status_in_same_call() {
        let fake = SnapshotLedger::new(Vec::new());
        let ledger = TrackingLedger::new(&fake);

        ledger
            .append(OrderId::new(7), entry("x"), true)
            .await
            .unwrap();

        let writes = fake.writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes.first().unwrap().status, Some(OrderStatus::Completed));
    }

    #[tokio::test]
    async fn test_remove_filters_by_id() {
        let fake = SnapshotLedger::new(vec![slot(&[entry("a"), entry("b"), entry("c")])]);
        let ledger = TrackingLedger::new(&fake);

        ledger.remove(OrderId::new(7), "b").await.unwrap();

        let writes = fake.writes.lock().unwrap();
        let entries = written_entries(writes.first().unwrap());
        assert_eq!(
            entries.iter().map(|e| e.id.as_str()).collect::<Vec<_>>(),
            vec!["a", "c"]
        );
    }

    #[tokio::test]
    async fn test_concurrent_appends_last_writer_wins() {
        // Regression guard for the accepted race: both appends read the
        // same snapshot, so the second write overwrites the first and its
        // entry is lost. This is the current contract, not a bug.
        let fake = SnapshotLedger::new(Vec::new());
        let ledger = TrackingLedger::new(&fake);

        ledger
            .append(OrderId::new(7), entry("first"), false)
            .await
            .unwrap();
        ledger
            .append(OrderId::new(7), entry("second"), false)
            .await
            .unwrap();

        let writes = fake.writes.lock().unwrap();
        let last = written_entries(writes.last().unwrap());
        assert_eq!(last.len(), 1);
        assert_eq!(last.first().unwrap().id, "second");
    }

    #[tokio::test]
    async fn test_list_swallows_undecodable_slot() {
        let fake = SnapshotLedger::new(vec![MetaData {
            id: None,
            key: TRACKING_META_KEY.to_string(),
            value: json!("not json at all {"),
        }]);
        let ledger = TrackingLedger::new(&fake);

        let entries = ledger.list(OrderId::new(7)).await.unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_entries_prefer_owned_slot() {
        let meta = vec![
            slot(&[entry("ours")]),
            MetaData {
                id: None,
                key: PLUGIN_META_KEY.to_string(),
                value: json!([{ "tracking_id": "plugin", "tracking_number": "P-1" }]),
            },
        ];
        let entries = entries_from_metadata(&meta);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries.first().unwrap().id, "ours");
    }

    #[test]
    fn test_plugin_slot_normalized_when_owned_absent() {
        let meta = vec![MetaData {
            id: None,
            key: PLUGIN_META_KEY.to_string(),
            value: json!([{
                "tracking_provider": "postnl",
                "tracking_number": "3S123",
                "date_shipped": "2026-01-15"
            }]),
        }];
        let entries = entries_from_metadata(&meta);
        assert_eq!(entries.len(), 1);
        let e = entries.first().unwrap();
        // No tracking_id, so the tracking number doubles as the id.
        assert_eq!(e.id, "3S123");
        assert_eq!(e.provider, "postnl");
    }

    #[test]
    fn test_decode_accepts_raw_array() {
        let value = json!([{ "id": "x", "provider": "ups", "tracking_number": "1Z", "date_shipped": "" }]);
        let entries = decode_entries(&value).unwrap();
        assert_eq!(entries.first().unwrap().id, "x");
    }

    #[test]
    fn test_new_entry_ids_are_unique() {
        let a = TrackingEntry::new("dhl", "TN-1", "2026-02-01");
        let b = TrackingEntry::new("dhl", "TN-1", "2026-02-01");
        assert_ne!(a.id, b.id);
    }
}
