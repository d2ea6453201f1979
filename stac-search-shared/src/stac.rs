//! Canonical STAC JSON structures.
//!
//! These are derived representations: the source of truth is the backend
//! document, and these types exist to shape search responses. They follow
//! STAC 1.0.0.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// STAC Item (a GeoJSON Feature).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StacItem {
    #[serde(rename = "type")]
    pub type_: String,
    pub stac_version: String,
    #[serde(default)]
    pub stac_extensions: Vec<String>,
    pub id: String,
    pub geometry: Option<Value>,
    pub bbox: Option<Vec<f64>>,
    pub properties: HashMap<String, Value>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub assets: HashMap<String, Asset>,
    pub collection: Option<String>,
}

/// STAC Collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StacCollection {
    #[serde(rename = "type")]
    pub type_: String,
    pub id: String,
    pub stac_version: String,
    #[serde(default)]
    pub stac_extensions: Vec<String>,
    pub title: Option<String>,
    pub description: String,
    pub license: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub providers: Vec<Provider>,
    pub extent: Extent,
    #[serde(default)]
    pub summaries: HashMap<String, Value>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub assets: HashMap<String, Asset>,
}

/// STAC Provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub name: String,
    #[serde(default)]
    pub roles: Vec<String>,
    pub url: Option<String>,
}

/// STAC Extent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Extent {
    pub spatial: SpatialExtent,
    pub temporal: TemporalExtent,
}

/// Spatial extent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpatialExtent {
    pub bbox: Vec<Vec<Option<f64>>>,
}

/// Temporal extent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporalExtent {
    pub interval: Vec<Vec<Option<String>>>,
}

/// STAC Link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
}

/// STAC Asset. Extension fields (e.g. `alternate`) are preserved verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub href: String,
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// A FeatureCollection of items: the search response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemCollection {
    #[serde(rename = "type")]
    pub type_: String,
    pub features: Vec<StacItem>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(rename = "numReturned")]
    pub num_returned: usize,
    #[serde(rename = "numMatched", skip_serializing_if = "Option::is_none")]
    pub num_matched: Option<u64>,
    /// Number of matching backend documents omitted from this page
    /// because they failed STAC conversion. Extension field, absent when
    /// zero.
    #[serde(rename = "numSkipped", default, skip_serializing_if = "is_zero")]
    pub num_skipped: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl ItemCollection {
    /// The continuation token carried by the `next` link, if any.
    pub fn next_token(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|link| link.rel == "next")
            .and_then(|link| link.href.split("token=").nth(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_item() {
        let json = r#"{
            "type": "Feature",
            "stac_version": "1.0.0",
            "id": "test-item",
            "geometry": null,
            "bbox": null,
            "properties": {
                "datetime": "2020-06-01T00:00:00Z"
            },
            "links": [],
            "assets": {},
            "collection": "test-collection"
        }"#;

        let item: StacItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.id, "test-item");
        assert_eq!(item.collection, Some("test-collection".to_string()));
    }

    #[test]
    fn test_item_requires_id() {
        let json = r#"{
            "type": "Feature",
            "stac_version": "1.0.0",
            "geometry": null,
            "bbox": null,
            "properties": {}
        }"#;

        assert!(serde_json::from_str::<StacItem>(json).is_err());
    }

    #[test]
    fn test_asset_preserves_extension_fields() {
        let json = r#"{
            "href": "https://example.org/data.nc",
            "type": "application/netcdf",
            "title": null,
            "alternate": {"s3": {"href": "s3://bucket/data.nc"}}
        }"#;

        let asset: Asset = serde_json::from_str(json).unwrap();
        assert!(asset.extra.contains_key("alternate"));
    }

    #[test]
    fn test_next_token_extraction() {
        let collection = ItemCollection {
            type_: "FeatureCollection".to_string(),
            features: vec![],
            links: vec![Link {
                rel: "next".to_string(),
                href: "/search?token=abc123".to_string(),
                type_: None,
                title: None,
                method: Some("GET".to_string()),
            }],
            num_returned: 0,
            num_matched: None,
            num_skipped: 0,
        };
        assert_eq!(collection.next_token(), Some("abc123"));
    }

    #[test]
    fn test_num_skipped_omitted_when_zero() {
        let collection = ItemCollection {
            type_: "FeatureCollection".to_string(),
            features: vec![],
            links: vec![],
            num_returned: 0,
            num_matched: Some(0),
            num_skipped: 0,
        };
        let json = serde_json::to_value(&collection).unwrap();
        assert!(json.get("numSkipped").is_none());

        let collection = ItemCollection {
            num_skipped: 2,
            ..collection
        };
        let json = serde_json::to_value(&collection).unwrap();
        assert_eq!(json["numSkipped"], 2);
    }
}
