//! Query compiler: STAC search semantics to the backend filter DSL.
//!
//! This module owns every backend-specific query quirk. Swapping the
//! backend means reimplementing this module and the client; nothing
//! outside sees the filter DSL.
//!
//! The compiler handles:
//! - bbox and polygon intersection filters (`geo_bounding_box`, `geo_shape`)
//! - temporal instants and intervals compiled to range overlap clauses
//! - recursive CQL2-like expression compilation, rejecting operators the
//!   backend cannot express instead of dropping them
//! - id/collection `match_any` filters (empty sets mean "no restriction")
//! - sort whitelisting and continuation-token cursor merging

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::errors::CompileError;
use crate::types::CompiledQuery;
use stac_search_shared::{
    fingerprint::fingerprint, token, Bbox, ComparisonOp, FilterExpr, Geometry, SearchRequest,
    SortSpec, TemporalFilter, MAX_LIMIT,
};

/// Fields the backend can sort on. Anything else fails with
/// [`CompileError::UnsortableField`] rather than producing a query the
/// backend would reject opaquely.
pub const SORTABLE_FIELDS: &[&str] = &[
    "id",
    "collection",
    "properties.datetime",
    "properties.start_datetime",
    "properties.end_datetime",
    "properties.created",
    "properties.updated",
];

const DATETIME_FIELD: &str = "properties.datetime";
const START_DATETIME_FIELD: &str = "properties.start_datetime";
const END_DATETIME_FIELD: &str = "properties.end_datetime";

/// Sentinel for an unbounded range endpoint.
const UNBOUNDED: &str = "*";

/// Compile a validated search request into a backend query.
pub fn compile(request: &SearchRequest) -> Result<CompiledQuery, CompileError> {
    let mut filters = Vec::new();

    // Empty id/collection sets are "no restriction", not "match nothing".
    if !request.ids.is_empty() {
        filters.push(match_any(
            "id",
            request.ids.iter().map(|s| Value::from(s.as_str())).collect(),
        ));
    }
    if !request.collections.is_empty() {
        filters.push(match_any(
            "collection",
            request
                .collections
                .iter()
                .map(|s| Value::from(s.as_str()))
                .collect(),
        ));
    }

    if let Some(bbox) = &request.bbox {
        filters.push(bbox_filter(bbox)?);
    }
    if let Some(geometry) = &request.intersects {
        filters.push(intersects_filter(geometry)?);
    }
    if let Some(datetime) = &request.datetime {
        filters.push(temporal_filter(datetime));
    }
    if let Some(expr) = &request.filter {
        filters.push(compile_filter_expr(expr)?);
    }

    let sort = compile_sort(&request.sortby)?;

    let offset = match &request.token {
        Some(tok) => {
            let (cursor, recorded_fp) = token::decode(tok)?;
            if recorded_fp != fingerprint(request) {
                return Err(CompileError::StaleContinuationToken);
            }
            cursor.offset
        }
        None => 0,
    };

    Ok(CompiledQuery {
        // filter-only searches still need a match-all query text
        q: "*".to_string(),
        limit: request.limit.clamp(1, MAX_LIMIT),
        offset,
        filters,
        sort,
    })
}

/// Map a STAC field name onto the backend document layout. Top-level item
/// fields stay as-is; everything else lives under `properties`.
fn translate_field_name(field: &str) -> String {
    if matches!(field, "id" | "collection" | "geometry") || field.starts_with("properties.") {
        field.to_string()
    } else {
        format!("properties.{}", field)
    }
}

fn match_any(field: &str, values: Vec<Value>) -> Value {
    json!({
        "type": "match_any",
        "field_name": field,
        "values": values,
    })
}

fn range(field: &str, from: Value, to: Value) -> Value {
    json!({
        "type": "range",
        "field_name": field,
        "values": [{"from": from, "to": to}],
    })
}

fn and_filter(filters: Vec<Value>) -> Value {
    json!({"type": "and", "filters": filters})
}

fn or_filter(filters: Vec<Value>) -> Value {
    json!({"type": "or", "filters": filters})
}

fn not_filter(inner: Value) -> Value {
    json!({"type": "not", "filter": inner})
}

fn exists_filter(field: &str) -> Value {
    json!({"type": "exists", "field_name": field})
}

/// Compile a bbox into a geo bounding box clause.
fn bbox_filter(bbox: &Bbox) -> Result<Value, CompileError> {
    bbox.validate()
        .map_err(|e| CompileError::geometry(e.to_string()))?;
    Ok(json!({
        "type": "geo_bounding_box",
        "field_name": "geometry",
        "top_left": {"lat": bbox.north, "lon": bbox.west},
        "bottom_right": {"lat": bbox.south, "lon": bbox.east},
    }))
}

/// Compile an intersects geometry into a geo shape clause.
fn intersects_filter(geometry: &Geometry) -> Result<Value, CompileError> {
    geometry
        .validate()
        .map_err(|e| CompileError::geometry(e.to_string()))?;
    let shape = serde_json::to_value(geometry)
        .map_err(|e| CompileError::geometry(e.to_string()))?;
    Ok(json!({
        "type": "geo_shape",
        "relation": "intersects",
        "field_name": "geometry",
        "shape": shape,
    }))
}

fn rfc3339(datetime: &DateTime<Utc>) -> String {
    datetime.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Compile a temporal filter.
///
/// An instant matches items whose single datetime equals it or whose
/// start/end range contains it. An interval matches items whose datetime
/// falls inside it or whose range overlaps it
/// (`item.start <= interval.end AND item.end >= interval.start`); open
/// bounds compile to unbounded range endpoints.
fn temporal_filter(filter: &TemporalFilter) -> Value {
    let (from, to) = match filter {
        TemporalFilter::Instant(t) => {
            let ts = rfc3339(t);
            (Value::from(ts.clone()), Value::from(ts))
        }
        TemporalFilter::Interval { start, end } => (
            start
                .as_ref()
                .map(|t| Value::from(rfc3339(t)))
                .unwrap_or_else(|| Value::from(UNBOUNDED)),
            end.as_ref()
                .map(|t| Value::from(rfc3339(t)))
                .unwrap_or_else(|| Value::from(UNBOUNDED)),
        ),
    };
    or_filter(vec![
        range(DATETIME_FIELD, from.clone(), to.clone()),
        and_filter(vec![
            range(START_DATETIME_FIELD, Value::from(UNBOUNDED), to),
            range(END_DATETIME_FIELD, from, Value::from(UNBOUNDED)),
        ]),
    ])
}

/// Recursively compile a property filter expression.
///
/// Operators the backend has no equivalent for (`<`, `>`, `like`) fail
/// with [`CompileError::UnsupportedFilterOperator`] naming the operator;
/// nothing is silently dropped.
fn compile_filter_expr(expr: &FilterExpr) -> Result<Value, CompileError> {
    match expr {
        FilterExpr::And(parts) => {
            let compiled = parts
                .iter()
                .map(compile_filter_expr)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(and_filter(compiled))
        }
        FilterExpr::Or(parts) => {
            let compiled = parts
                .iter()
                .map(compile_filter_expr)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(or_filter(compiled))
        }
        FilterExpr::Not(inner) => {
            let compiled = compile_filter_expr(inner)?;
            // not(not(x)) == x
            if compiled["type"] == "not" {
                if let Some(unwrapped) = compiled.get("filter") {
                    return Ok(unwrapped.clone());
                }
            }
            Ok(not_filter(compiled))
        }
        FilterExpr::Comparison { op, field, value } => {
            let field = translate_field_name(field);
            match op {
                ComparisonOp::Eq => Ok(match_any(&field, vec![value.clone()])),
                ComparisonOp::Neq => Ok(not_filter(match_any(&field, vec![value.clone()]))),
                ComparisonOp::Lte => Ok(range(&field, Value::from(UNBOUNDED), value.clone())),
                ComparisonOp::Gte => Ok(range(&field, value.clone(), Value::from(UNBOUNDED))),
                // the backend only has inclusive range endpoints
                ComparisonOp::Lt | ComparisonOp::Gt => {
                    Err(CompileError::operator(op.to_string()))
                }
            }
        }
        FilterExpr::IsNull { field } => {
            Ok(not_filter(exists_filter(&translate_field_name(field))))
        }
        // no regex/wildcard filter in the backend DSL
        FilterExpr::Like { .. } => Err(CompileError::operator("like")),
        FilterExpr::In { field, values } => {
            Ok(match_any(&translate_field_name(field), values.clone()))
        }
        FilterExpr::Between { field, low, high } => {
            Ok(range(&translate_field_name(field), low.clone(), high.clone()))
        }
    }
}

/// Compile the sort specification through the sortable-field whitelist.
fn compile_sort(specs: &[SortSpec]) -> Result<Vec<Value>, CompileError> {
    specs
        .iter()
        .map(|spec| {
            let field = translate_field_name(&spec.field);
            if !SORTABLE_FIELDS.contains(&field.as_str()) {
                return Err(CompileError::unsortable(spec.field.clone()));
            }
            Ok(json!({"field_name": field, "order": spec.direction.as_str()}))
        })
        .collect()
}
