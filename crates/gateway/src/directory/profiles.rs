//! Tenant profile rows.

use serde::{Deserialize, Serialize};
use serde_json::json;

use storedeck_core::Email;

use super::{DirectoryClient, DirectoryError, Filter};

/// Directory table holding tenant profiles, one row per tenant.
const TABLE: &str = "profiles";

/// A tenant's display profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
}

/// Repository for tenant profiles.
pub struct ProfileRepository<'a> {
    directory: &'a DirectoryClient,
}

impl<'a> ProfileRepository<'a> {
    #[must_use]
    pub const fn new(directory: &'a DirectoryClient) -> Self {
        Self { directory }
    }

    /// Fetch the tenant's profile, defaulting to an empty one when the
    /// row does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] if the directory query fails.
    pub async fn get(&self, tenant: &Email) -> Result<Profile, DirectoryError> {
        let rows: Vec<Profile> = self
            .directory
            .select(
                TABLE,
                &[Filter {
                    column: "owner",
                    value: tenant.as_str(),
                }],
                Some(1),
            )
            .await?;
        Ok(rows.into_iter().next().unwrap_or_default())
    }

    /// Upsert the tenant's profile wholesale (no partial patch).
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] if the directory call fails.
    pub async fn upsert(&self, tenant: &Email, profile: &Profile) -> Result<(), DirectoryError> {
        self.directory
            .insert::<serde_json::Value>(
                TABLE,
                &json!([{
                    "owner": tenant.as_str(),
                    "name": profile.name,
                    "image": profile.image,
                }]),
                &[("Prefer", "resolution=merge-duplicates")],
            )
            .await
            .map(|_| ())
    }
}
