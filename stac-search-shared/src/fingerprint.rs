//! Request fingerprinting.
//!
//! A continuation token records the fingerprint of the request that
//! produced it. When the token is replayed, the compiler compares the
//! recorded fingerprint against the current request; a mismatch means the
//! client changed filters mid-pagination and the token is stale.
//!
//! The fingerprint covers the filter and sort shape only. Limit and token
//! are excluded, so a client may vary the page size while paging.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::request::{Bbox, FilterExpr, Geometry, SearchRequest, SortSpec, TemporalFilter};

/// Number of hex characters kept from the digest.
const FINGERPRINT_LEN: usize = 16;

#[derive(Serialize)]
struct FingerprintFields<'a> {
    collections: &'a [String],
    ids: &'a [String],
    bbox: &'a Option<Bbox>,
    intersects: &'a Option<Geometry>,
    datetime: &'a Option<TemporalFilter>,
    filter: &'a Option<FilterExpr>,
    sortby: &'a [SortSpec],
}

/// Compute the fingerprint of a search request's filter and sort shape.
pub fn fingerprint(request: &SearchRequest) -> String {
    let fields = FingerprintFields {
        collections: &request.collections,
        ids: &request.ids,
        bbox: &request.bbox,
        intersects: &request.intersects,
        datetime: &request.datetime,
        filter: &request.filter,
        sortby: &request.sortby,
    };
    let canonical = serde_json::to_value(&fields)
        .unwrap_or(Value::Null)
        .to_string();
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let digest = hasher.finalize();
    digest
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect::<String>()[..FINGERPRINT_LEN]
        .to_string()
}
