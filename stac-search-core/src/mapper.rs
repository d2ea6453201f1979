//! Result mapper: backend documents to STAC items.
//!
//! The backend stores assets as a list of named objects (its schema has no
//! stable map keys); STAC wants a map keyed by asset name. This module
//! converts back, rebuilds `alternate` sub-maps the same way, and encodes
//! the next-page continuation token.

use serde_json::Value;
use tracing::{debug, warn};

use stac_search_repository::{ResultEntry, ResultPage};
use stac_search_shared::{fingerprint::fingerprint, token, SearchRequest, StacItem};

/// A page of mapped results.
#[derive(Debug)]
pub struct MappedPage {
    /// Converted items, in backend order.
    pub items: Vec<StacItem>,
    /// Continuation token, present only when the backend signaled more
    /// results.
    pub next_token: Option<String>,
    /// Number of documents skipped because they were missing required
    /// STAC fields.
    pub skipped: usize,
}

/// Map one backend result page into STAC items.
///
/// Documents missing required STAC fields are skipped with a counted
/// warning rather than failing the whole page: partial results win over
/// total failure, but the omission count stays observable.
pub fn map_page(page: &ResultPage, request: &SearchRequest) -> MappedPage {
    let mut items = Vec::with_capacity(page.entries.len());
    let mut skipped = 0;

    for entry in &page.entries {
        match entry_to_item(entry) {
            Some(item) => items.push(item),
            None => {
                skipped += 1;
                warn!(subject = %entry.subject, "Skipping document missing required STAC fields");
            }
        }
    }

    let next_token = page
        .next_cursor
        .as_ref()
        .map(|cursor| token::encode(cursor, &fingerprint(request)));

    MappedPage {
        items,
        next_token,
        skipped,
    }
}

/// Convert one backend document into a STAC item.
pub(crate) fn entry_to_item(entry: &ResultEntry) -> Option<StacItem> {
    let mut content = entry.content.clone();

    if let Some(assets) = content.get("assets").and_then(Value::as_array).cloned() {
        content["assets"] = assets_list_to_map(&assets);
    }

    match serde_json::from_value(content) {
        Ok(item) => Some(item),
        Err(e) => {
            debug!(subject = %entry.subject, error = %e, "Document failed STAC conversion");
            None
        }
    }
}

/// Rebuild the STAC assets map from the backend's named-list form.
/// List entries without a `name` cannot be keyed and are dropped.
fn assets_list_to_map(assets: &[Value]) -> Value {
    let mut map = serde_json::Map::new();

    for asset in assets {
        let Some(obj) = asset.as_object() else {
            continue;
        };
        let Some(name) = obj.get("name").and_then(Value::as_str) else {
            continue;
        };

        let mut fields = obj.clone();
        fields.remove("name");

        if let Some(Value::Array(alternates)) = fields.get("alternate").cloned() {
            let mut alternate_map = serde_json::Map::new();
            for alternate in alternates {
                let Some(alt_obj) = alternate.as_object() else {
                    continue;
                };
                let Some(alt_name) = alt_obj.get("name").and_then(Value::as_str) else {
                    continue;
                };
                let mut alt_fields = alt_obj.clone();
                alt_fields.remove("name");
                alternate_map.insert(alt_name.to_string(), Value::Object(alt_fields));
            }
            fields.insert("alternate".to_string(), Value::Object(alternate_map));
        }

        map.insert(name.to_string(), Value::Object(fields));
    }

    Value::Object(map)
}
