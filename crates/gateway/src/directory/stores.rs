//! Store-credential rows and the credential resolver.
//!
//! A store row belongs to exactly one tenant; the `owner` column is the
//! isolation boundary. Resolution filters on both the store id and the
//! requesting tenant, so a store that exists but belongs to someone else
//! is indistinguishable from one that does not exist at all.

use serde::{Deserialize, Serialize};
use serde_json::json;

use storedeck_core::{Email, StoreId};

use crate::upstream::StoreCredential;

use super::{DirectoryClient, DirectoryError, Filter};

/// Directory table holding store credentials.
const TABLE: &str = "stores";

/// A store credential row as the directory returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreRecord {
    pub id: StoreId,
    /// Owning tenant identity.
    pub owner: Email,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
}

impl StoreRecord {
    /// The credential fields of this row, ready for merging with
    /// environment defaults.
    #[must_use]
    pub fn credential(&self) -> StoreCredential {
        StoreCredential {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            api_secret: self.api_secret.clone(),
        }
    }
}

/// Input for registering a store.
#[derive(Debug, Deserialize)]
pub struct NewStore {
    pub name: String,
    pub base_url: String,
    pub api_key: String,
    pub api_secret: String,
}

/// Input for editing a store. Absent fields are left untouched.
#[derive(Debug, Deserialize, Default)]
pub struct StoreUpdate {
    pub name: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
}

/// Repository for store-credential rows.
pub struct StoreRepository<'a> {
    directory: &'a DirectoryClient,
}

impl<'a> StoreRepository<'a> {
    #[must_use]
    pub const fn new(directory: &'a DirectoryClient) -> Self {
        Self { directory }
    }

    /// Resolve a store for a tenant.
    ///
    /// Returns `None` both when the id is unknown and when the row
    /// belongs to another tenant; the two cases must not be told apart.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] if the directory query fails.
    pub async fn resolve(
        &self,
        tenant: &Email,
        store_id: &StoreId,
    ) -> Result<Option<StoreRecord>, DirectoryError> {
        let rows: Vec<StoreRecord> = self
            .directory
            .select(
                TABLE,
                &[
                    Filter {
                        column: "id",
                        value: store_id.as_str(),
                    },
                    Filter {
                        column: "owner",
                        value: tenant.as_str(),
                    },
                ],
                Some(1),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    /// List every store the tenant owns.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] if the directory query fails.
    pub async fn list(&self, tenant: &Email) -> Result<Vec<StoreRecord>, DirectoryError> {
        self.directory
            .select(
                TABLE,
                &[Filter {
                    column: "owner",
                    value: tenant.as_str(),
                }],
                None,
            )
            .await
    }

    /// Register a store. The owner is always the requesting tenant; a
    /// caller-supplied owner field cannot exist in [`NewStore`].
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Parse`] when the directory does not echo
    /// the inserted row back.
    pub async fn create(
        &self,
        tenant: &Email,
        store: &NewStore,
    ) -> Result<StoreRecord, DirectoryError> {
        let rows: Vec<StoreRecord> = self
            .directory
            .insert(
                TABLE,
                &json!([{
                    "owner": tenant.as_str(),
                    "name": store.name,
                    "base_url": store.base_url,
                    "api_key": store.api_key,
                    "api_secret": store.api_secret,
                }]),
                &[],
            )
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| DirectoryError::Parse("insert returned no representation".to_string()))
    }

    /// Edit a store. The owner filter rides on the PATCH, so a tenant
    /// can never reach another tenant's row.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] if the directory call fails.
    pub async fn update(
        &self,
        tenant: &Email,
        store_id: &StoreId,
        update: &StoreUpdate,
    ) -> Result<(), DirectoryError> {
        let mut patch = serde_json::Map::new();
        if let Some(name) = &update.name {
            patch.insert("name".to_string(), json!(name));
        }
        if let Some(base_url) = &update.base_url {
            patch.insert("base_url".to_string(), json!(base_url));
        }
        if let Some(api_key) = &update.api_key {
            patch.insert("api_key".to_string(), json!(api_key));
        }
        if let Some(api_secret) = &update.api_secret {
            patch.insert("api_secret".to_string(), json!(api_secret));
        }

        self.directory
            .update(
                TABLE,
                &[
                    Filter {
                        column: "id",
                        value: store_id.as_str(),
                    },
                    Filter {
                        column: "owner",
                        value: tenant.as_str(),
                    },
                ],
                &serde_json::Value::Object(patch),
            )
            .await
    }

    /// Delete a store. Hard delete; in-flight requests holding the
    /// credential race the delete, an accepted loss.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] if the directory call fails.
    pub async fn delete(&self, tenant: &Email, store_id: &StoreId) -> Result<(), DirectoryError> {
        self.directory
            .delete(
                TABLE,
                &[
                    Filter {
                        column: "id",
                        value: store_id.as_str(),
                    },
                    Filter {
                        column: "owner",
                        value: tenant.as_str(),
                    },
                ],
            )
            .await
    }
}
