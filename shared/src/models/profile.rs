//! Staff Profile Model

use super::Restaurant;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Staff profile joined with its restaurant (`profiles?select=*,restaurant(*)`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffProfile {
    /// Auth user id
    pub id: Uuid,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub restaurant: Restaurant,
}

impl StaffProfile {
    /// Tenant scope for every admin read/write
    pub fn restaurant_slug(&self) -> &str {
        &self.restaurant.slug
    }

    /// Name shown in the dashboard header
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_joined_row() {
        let json = r#"{
            "id": "6f1c1f9e-4d0b-4f7a-9a43-8f3c2d1b0a11",
            "email": "host@spice.house",
            "full_name": null,
            "restaurant": {"id": 1, "name": "Spice House", "slug": "spice-house"}
        }"#;
        let profile: StaffProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.restaurant_slug(), "spice-house");
        assert_eq!(profile.display_name(), "host@spice.house");
    }
}
