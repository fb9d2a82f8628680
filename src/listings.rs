//! Startup seeding of the registry from the external listings store.

use serde::{Deserialize, Deserializer};
use url::Url;

use crate::error::GatewayError;
use crate::registry::{Registry, RegistryEntry};

/// One active listing as served by the listings read API.
#[derive(Debug, Clone, Deserialize)]
pub struct ListingRecord {
    #[serde(alias = "apiId", alias = "listingId")]
    pub id: String,
    pub slug: String,
    #[serde(alias = "originUrl", alias = "baseUrl", alias = "base_url")]
    pub origin_url: String,
    #[serde(
        alias = "pricePerCall",
        alias = "price_per_call",
        deserialize_with = "de_price"
    )]
    pub price: f64,
    pub owner: String,
}

#[derive(Debug, Deserialize)]
struct ListingsEnvelope {
    data: Vec<ListingRecord>,
}

/// Accept a price as either a JSON number or a numeric string — the listings
/// store serves prices as strings.
pub(crate) fn de_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| D::Error::custom("price out of range")),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("invalid price string: {}", s))),
        other => Err(D::Error::custom(format!(
            "price must be a number or string, got {}",
            other
        ))),
    }
}

/// Fetch all active listings and register each with the gateway.
///
/// Records with an empty or unparseable origin URL are skipped with a
/// warning rather than failing the whole seed, matching how the surrounding
/// system tolerates half-filled listings. Returns the number registered.
pub async fn seed_registry(
    client: &reqwest::Client,
    listings_url: &str,
    registry: &Registry,
) -> Result<usize, GatewayError> {
    let envelope: ListingsEnvelope = client
        .get(listings_url)
        .send()
        .await
        .map_err(|e| GatewayError::Internal(format!("listings fetch failed: {}", e)))?
        .json()
        .await
        .map_err(|e| GatewayError::Internal(format!("listings response malformed: {}", e)))?;

    let mut registered = 0;
    for listing in envelope.data {
        if listing.origin_url.trim().is_empty() {
            tracing::warn!(listing = %listing.id, "skipping listing with empty origin URL");
            continue;
        }
        if Url::parse(&listing.origin_url).is_err() {
            tracing::warn!(
                listing = %listing.id,
                url = %listing.origin_url,
                "skipping listing with invalid origin URL"
            );
            continue;
        }

        registry.register(RegistryEntry {
            slug: listing.slug,
            origin_base_url: listing.origin_url,
            price_per_call: listing.price,
            owner: listing.owner,
            listing_id: listing.id,
        })?;
        registered += 1;
    }

    Ok(registered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_accepts_number_or_string() {
        let record: ListingRecord = serde_json::from_value(serde_json::json!({
            "id": "api_1",
            "slug": "weather",
            "originUrl": "https://example.test",
            "pricePerCall": "0.05",
            "owner": "P1"
        }))
        .unwrap();
        assert_eq!(record.price, 0.05);

        let record: ListingRecord = serde_json::from_value(serde_json::json!({
            "id": "api_2",
            "slug": "geo",
            "baseUrl": "https://geo.example.test",
            "price": 50,
            "owner": "P2"
        }))
        .unwrap();
        assert_eq!(record.price, 50.0);
    }

    #[test]
    fn price_rejects_garbage() {
        let result: Result<ListingRecord, _> = serde_json::from_value(serde_json::json!({
            "id": "api_1",
            "slug": "weather",
            "originUrl": "https://example.test",
            "price": "fifty",
            "owner": "P1"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn envelope_shape_matches_listings_api() {
        let envelope: ListingsEnvelope = serde_json::from_value(serde_json::json!({
            "success": true,
            "data": [{
                "id": "api_1",
                "slug": "weather",
                "originUrl": "https://example.test",
                "price": "50",
                "owner": "P1"
            }]
        }))
        .unwrap();
        assert_eq!(envelope.data.len(), 1);
    }
}
