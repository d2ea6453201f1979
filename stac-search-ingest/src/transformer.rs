//! Ingest transformer: source records to backend documents.
//!
//! The inverse of the result mapper's asset handling lives here: STAC
//! stores assets as a map keyed by name, the backend wants a list of
//! named objects. `alternate` sub-maps are unrolled the same way.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::errors::TransformError;
use stac_search_shared::{BackendDocument, Geometry, SCHEMA_VERSION};

/// One record handed to the ingest pipeline: a STAC item plus the
/// access-control metadata the catalog attached to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRecord {
    /// The STAC item as raw JSON.
    pub item: Value,
    /// Visibility tags for the resulting document. Required; a record
    /// without them is rejected rather than defaulted to public.
    pub visible_to: Option<Vec<String>>,
}

impl SourceRecord {
    pub fn new(item: Value, visible_to: Vec<String>) -> Self {
        Self {
            item,
            visible_to: Some(visible_to),
        }
    }
}

/// Stateless converter from source records to backend documents.
#[derive(Debug, Clone, Default)]
pub struct IngestTransformer;

impl IngestTransformer {
    pub fn new() -> Self {
        Self
    }

    /// Convert one source record into a backend document.
    ///
    /// # Arguments
    /// * `record` - the STAC item and its visibility metadata
    ///
    /// # Returns
    /// The document ready for the backend, or a [`TransformError`] naming
    /// what was wrong with the record.
    pub fn transform(&self, record: &SourceRecord) -> Result<BackendDocument, TransformError> {
        let visible_to = match &record.visible_to {
            Some(tags) if !tags.is_empty() => tags.clone(),
            _ => return Err(TransformError::MissingVisibilityMetadata),
        };

        let item_id = required_string(&record.item, "id")?;
        let collection = required_string(&record.item, "collection")?;

        let mut content = record.item.clone();
        validate_geometry(&content)?;
        normalize_datetimes(&mut content)?;

        if let Some(assets) = content.get("assets").and_then(Value::as_object).cloned() {
            content["assets"] = assets_map_to_list(&assets);
        }

        let subject = BackendDocument::subject_for(&collection, &item_id);
        debug!(%subject, "Transformed source record");

        Ok(BackendDocument {
            subject,
            visible_to,
            content,
            ingested_at: Utc::now(),
            schema_version: SCHEMA_VERSION,
        })
    }
}

fn required_string(item: &Value, field: &str) -> Result<String, TransformError> {
    match item.get(field).and_then(Value::as_str) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(TransformError::invalid(format!(
            "item is missing '{}'",
            field
        ))),
    }
}

/// Reject items whose geometry is present but not a usable GeoJSON object.
/// Polygons additionally go through ring validation; a null geometry is
/// allowed (items without a footprint exist in real catalogs).
fn validate_geometry(content: &Value) -> Result<(), TransformError> {
    let Some(geometry) = content.get("geometry") else {
        return Ok(());
    };
    if geometry.is_null() {
        return Ok(());
    }
    if !geometry.is_object() {
        return Err(TransformError::invalid("geometry must be an object or null"));
    }
    if geometry.get("type").and_then(Value::as_str) == Some("Polygon") {
        let polygon: Geometry = serde_json::from_value(geometry.clone())
            .map_err(|e| TransformError::invalid(format!("geometry: {}", e)))?;
        polygon
            .validate()
            .map_err(|e| TransformError::invalid(format!("geometry: {}", e)))?;
    }
    Ok(())
}

const DATETIME_PROPERTIES: [&str; 5] = [
    "datetime",
    "start_datetime",
    "end_datetime",
    "created",
    "updated",
];

/// Rewrite the item's temporal properties to RFC 3339 UTC (`Z` suffix) so
/// range filters compare lexically in the backend.
fn normalize_datetimes(content: &mut Value) -> Result<(), TransformError> {
    let Some(properties) = content.get_mut("properties").and_then(Value::as_object_mut) else {
        return Err(TransformError::invalid("item is missing 'properties'"));
    };
    for field in DATETIME_PROPERTIES {
        let Some(value) = properties.get(field) else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        let Some(raw) = value.as_str() else {
            return Err(TransformError::invalid(format!(
                "properties.{} must be a string",
                field
            )));
        };
        let parsed = DateTime::parse_from_rfc3339(raw).map_err(|e| {
            TransformError::invalid(format!("properties.{}: {}", field, e))
        })?;
        let normalized = parsed
            .with_timezone(&Utc)
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        properties.insert(field.to_string(), Value::String(normalized));
    }
    Ok(())
}

/// Unroll the STAC assets map into the backend's named-list form.
fn assets_map_to_list(assets: &serde_json::Map<String, Value>) -> Value {
    let mut list = Vec::with_capacity(assets.len());

    for (name, asset) in assets {
        let mut fields = match asset.as_object() {
            Some(obj) => obj.clone(),
            None => continue,
        };
        fields.insert("name".to_string(), Value::String(name.clone()));

        if let Some(Value::Object(alternates)) = fields.get("alternate").cloned() {
            let alternate_list: Vec<Value> = alternates
                .iter()
                .filter_map(|(alt_name, alt)| {
                    let mut alt_fields = alt.as_object()?.clone();
                    alt_fields.insert("name".to_string(), Value::String(alt_name.clone()));
                    Some(Value::Object(alt_fields))
                })
                .collect();
            fields.insert("alternate".to_string(), Value::Array(alternate_list));
        }

        list.push(Value::Object(fields));
    }

    Value::Array(list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(id: &str) -> Value {
        json!({
            "type": "Feature",
            "stac_version": "1.0.0",
            "id": id,
            "geometry": null,
            "bbox": null,
            "properties": {"datetime": "2020-06-01T00:00:00Z"},
            "links": [],
            "assets": {},
            "collection": "cmip6",
        })
    }

    #[test]
    fn test_transform_builds_stable_subject() {
        let transformer = IngestTransformer::new();
        let record = SourceRecord::new(item("item-001"), vec!["public".to_string()]);

        let doc = transformer.transform(&record).unwrap();
        assert_eq!(doc.subject, "cmip6_item-001");
        assert_eq!(doc.visible_to, vec!["public".to_string()]);
        assert_eq!(doc.schema_version, SCHEMA_VERSION);

        let again = transformer.transform(&record).unwrap();
        assert_eq!(doc.subject, again.subject);
    }

    #[test]
    fn test_missing_visibility_is_rejected() {
        let transformer = IngestTransformer::new();

        let record = SourceRecord {
            item: item("item-001"),
            visible_to: None,
        };
        assert_eq!(
            transformer.transform(&record).unwrap_err(),
            TransformError::MissingVisibilityMetadata
        );

        let record = SourceRecord::new(item("item-001"), vec![]);
        assert_eq!(
            transformer.transform(&record).unwrap_err(),
            TransformError::MissingVisibilityMetadata
        );
    }

    #[test]
    fn test_missing_id_and_collection_name_the_field() {
        let transformer = IngestTransformer::new();

        let mut no_id = item("item-001");
        no_id.as_object_mut().unwrap().remove("id");
        let err = transformer
            .transform(&SourceRecord::new(no_id, vec!["public".to_string()]))
            .unwrap_err();
        assert!(err.to_string().contains("'id'"));

        let mut no_collection = item("item-001");
        no_collection.as_object_mut().unwrap().remove("collection");
        let err = transformer
            .transform(&SourceRecord::new(no_collection, vec!["public".to_string()]))
            .unwrap_err();
        assert!(err.to_string().contains("'collection'"));
    }

    #[test]
    fn test_datetimes_are_normalized_to_utc() {
        let transformer = IngestTransformer::new();
        let mut record_item = item("item-001");
        record_item["properties"]["datetime"] = json!("2020-06-01T02:00:00+02:00");

        let doc = transformer
            .transform(&SourceRecord::new(record_item, vec!["public".to_string()]))
            .unwrap();
        assert_eq!(
            doc.content["properties"]["datetime"],
            "2020-06-01T00:00:00Z"
        );
    }

    #[test]
    fn test_bad_datetime_is_rejected() {
        let transformer = IngestTransformer::new();
        let mut record_item = item("item-001");
        record_item["properties"]["datetime"] = json!("June 1st 2020");

        let err = transformer
            .transform(&SourceRecord::new(record_item, vec!["public".to_string()]))
            .unwrap_err();
        assert!(err.to_string().contains("datetime"));
    }

    #[test]
    fn test_bad_polygon_is_rejected() {
        let transformer = IngestTransformer::new();
        let mut record_item = item("item-001");
        // open ring
        record_item["geometry"] = json!({
            "type": "Polygon",
            "coordinates": [[[6.0, 53.0], [7.0, 53.0], [7.0, 54.0], [6.0, 54.0]]]
        });

        let err = transformer
            .transform(&SourceRecord::new(record_item, vec!["public".to_string()]))
            .unwrap_err();
        assert!(matches!(err, TransformError::InvalidSourceRecord(_)));
    }

    #[test]
    fn test_polygon_with_elevation_is_accepted() {
        let transformer = IngestTransformer::new();
        let mut record_item = item("item-001");
        record_item["geometry"] = json!({
            "type": "Polygon",
            "coordinates": [[
                [6.0, 53.0, 120.5],
                [7.0, 53.0, 121.0],
                [7.0, 54.0, 119.0],
                [6.0, 54.0, 118.5],
                [6.0, 53.0, 120.5]
            ]]
        });

        assert!(transformer
            .transform(&SourceRecord::new(record_item, vec!["public".to_string()]))
            .is_ok());
    }

    #[test]
    fn test_assets_map_becomes_named_list() {
        let transformer = IngestTransformer::new();
        let mut record_item = item("item-001");
        record_item["assets"] = json!({
            "data": {
                "href": "https://example.org/data.nc",
                "type": "application/netcdf",
                "alternate": {
                    "s3": {"href": "s3://bucket/data.nc"}
                }
            }
        });

        let doc = transformer
            .transform(&SourceRecord::new(record_item, vec!["public".to_string()]))
            .unwrap();
        let assets = doc.content["assets"].as_array().unwrap();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0]["name"], "data");
        assert_eq!(assets[0]["href"], "https://example.org/data.nc");

        let alternates = assets[0]["alternate"].as_array().unwrap();
        assert_eq!(alternates[0]["name"], "s3");
        assert_eq!(alternates[0]["href"], "s3://bucket/data.nc");
    }
}
