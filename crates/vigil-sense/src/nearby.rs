//! Nearby emergency services lookup.
//!
//! The backend is a geocoded search returning a ranked list of places.
//! An empty or failing response degrades to a single manual-map-search
//! link rather than an empty list, so the UI always has something to
//! offer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::Result;

/// One ranked search result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Place {
    pub title: String,
    pub uri: String,
    pub address: Option<String>,
    pub distance_m: Option<f64>,
}

/// Geocoded place search backend.
#[async_trait]
pub trait NearbyLookup: Send + Sync {
    async fn search(&self, latitude: f64, longitude: f64) -> Result<Vec<Place>>;
}

/// Search with the degradation contract applied: errors and empty result
/// sets both yield the manual-search fallback entry.
pub async fn search_with_fallback(
    lookup: &dyn NearbyLookup,
    latitude: f64,
    longitude: f64,
) -> Vec<Place> {
    match lookup.search(latitude, longitude).await {
        Ok(places) if !places.is_empty() => places,
        Ok(_) => vec![manual_search_place(latitude, longitude)],
        Err(e) => {
            warn!(error = %e, "nearby lookup failed, degrading to manual search link");
            vec![manual_search_place(latitude, longitude)]
        }
    }
}

fn manual_search_place(latitude: f64, longitude: f64) -> Place {
    Place {
        title: "Search for help nearby".to_string(),
        uri: format!(
            "https://www.openstreetmap.org/search?query=police%20station#map=15/{latitude}/{longitude}"
        ),
        address: None,
        distance_m: None,
    }
}
