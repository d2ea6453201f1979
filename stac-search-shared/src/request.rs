//! Normalized search request model.
//!
//! The web-service layer parses whatever wire format it speaks (query string,
//! JSON body) into a [`SearchRequest`]. Everything downstream — the query
//! compiler, the orchestrator, the result mapper — works from this structure.

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// Default page size when the client does not ask for one.
pub const DEFAULT_LIMIT: usize = 10;

/// Maximum page size; larger requests are clamped, never rejected.
pub const MAX_LIMIT: usize = 100;

/// A validation failure for a bounding box or geometry.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{0}")]
pub struct GeometryError(String);

impl GeometryError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// A WGS84 bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bbox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Bbox {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Build a bbox from a 4- or 6-element coordinate array.
    ///
    /// A 6-element bbox carries elevation bounds at indices 2 and 5, which
    /// are dropped (indices 0, 1, 3, 4 are kept).
    pub fn from_coords(coords: &[f64]) -> Result<Self, GeometryError> {
        let bbox = match coords.len() {
            4 => Self::new(coords[0], coords[1], coords[2], coords[3]),
            6 => Self::new(coords[0], coords[1], coords[3], coords[4]),
            other => {
                return Err(GeometryError::new(format!(
                    "bbox must have 4 or 6 coordinates, got {}",
                    other
                )))
            }
        };
        bbox.validate()?;
        Ok(bbox)
    }

    /// Validate coordinate ranges and ordering.
    pub fn validate(&self) -> Result<(), GeometryError> {
        let coords = [self.west, self.south, self.east, self.north];
        if coords.iter().any(|c| !c.is_finite()) {
            return Err(GeometryError::new("bbox coordinates must be finite"));
        }
        if !(-180.0..=180.0).contains(&self.west) || !(-180.0..=180.0).contains(&self.east) {
            return Err(GeometryError::new("bbox longitudes must be in [-180, 180]"));
        }
        if !(-90.0..=90.0).contains(&self.south) || !(-90.0..=90.0).contains(&self.north) {
            return Err(GeometryError::new("bbox latitudes must be in [-90, 90]"));
        }
        if self.south > self.north {
            return Err(GeometryError::new("bbox south must not exceed north"));
        }
        if self.west > self.east {
            return Err(GeometryError::new("bbox west must not exceed east"));
        }
        Ok(())
    }
}

/// A single lon/lat position.
///
/// GeoJSON allows a third elevation element per position; it is accepted
/// on input and dropped, the same way [`Bbox::from_coords`] drops
/// elevation bounds from 6-element boxes. Positions always serialize
/// back as `[lon, lat]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub lon: f64,
    pub lat: f64,
}

impl Position {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [self.lon, self.lat].serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let coords = Vec::<f64>::deserialize(deserializer)?;
        match coords.as_slice() {
            [lon, lat] | [lon, lat, _] => Ok(Self {
                lon: *lon,
                lat: *lat,
            }),
            other => Err(de::Error::invalid_length(
                other.len(),
                &"a position of 2 or 3 coordinates",
            )),
        }
    }
}

/// A GeoJSON geometry accepted as a spatial filter.
///
/// Only simple polygons are supported for `intersects` searches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon { coordinates: Vec<Vec<Position>> },
}

impl Geometry {
    /// Validate that the polygon is a simple closed ring.
    pub fn validate(&self) -> Result<(), GeometryError> {
        let Geometry::Polygon { coordinates } = self;
        let ring = coordinates
            .first()
            .ok_or_else(|| GeometryError::new("polygon must have an exterior ring"))?;
        if ring.len() < 4 {
            return Err(GeometryError::new(
                "polygon ring must have at least 4 positions",
            ));
        }
        if ring.first() != ring.last() {
            return Err(GeometryError::new("polygon ring must be closed"));
        }
        if ring
            .iter()
            .any(|p| !p.lon.is_finite() || !p.lat.is_finite())
        {
            return Err(GeometryError::new("polygon coordinates must be finite"));
        }
        if ring_self_intersects(ring) {
            return Err(GeometryError::new("polygon ring must not self-intersect"));
        }
        Ok(())
    }
}

/// Check a closed ring for proper self-intersection between non-adjacent edges.
fn ring_self_intersects(ring: &[Position]) -> bool {
    // ring is closed, so there are len - 1 edges
    let edges = ring.len() - 1;
    for i in 0..edges {
        for j in (i + 2)..edges {
            // the first and last edges share the closing vertex
            if i == 0 && j == edges - 1 {
                continue;
            }
            if segments_cross(ring[i], ring[i + 1], ring[j], ring[j + 1]) {
                return true;
            }
        }
    }
    false
}

fn segments_cross(a: Position, b: Position, c: Position, d: Position) -> bool {
    fn orient(p: Position, q: Position, r: Position) -> f64 {
        (q.lon - p.lon) * (r.lat - p.lat) - (q.lat - p.lat) * (r.lon - p.lon)
    }
    let d1 = orient(a, b, c);
    let d2 = orient(a, b, d);
    let d3 = orient(c, d, a);
    let d4 = orient(c, d, b);
    d1 * d2 < 0.0 && d3 * d4 < 0.0
}

/// Failure to parse a datetime filter string.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Invalid datetime filter: {0}")]
pub struct TemporalParseError(String);

/// Temporal filter: a single instant or a closed/open interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TemporalFilter {
    Instant(DateTime<Utc>),
    Interval {
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    },
}

impl TemporalFilter {
    /// Parse a STAC datetime parameter: `"t"`, `"s/e"`, `"../e"`, or `"s/.."`.
    pub fn parse(input: &str) -> Result<Self, TemporalParseError> {
        let parse_one = |part: &str| -> Result<DateTime<Utc>, TemporalParseError> {
            DateTime::parse_from_rfc3339(part)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| TemporalParseError(format!("'{}': {}", part, e)))
        };
        match input.split_once('/') {
            None => Ok(Self::Instant(parse_one(input)?)),
            Some((start, end)) => {
                let start = match start {
                    ".." | "" => None,
                    s => Some(parse_one(s)?),
                };
                let end = match end {
                    ".." | "" => None,
                    e => Some(parse_one(e)?),
                };
                if start.is_none() && end.is_none() {
                    return Err(TemporalParseError(
                        "interval must have at least one bound".to_string(),
                    ));
                }
                if let (Some(s), Some(e)) = (start, end) {
                    if s > e {
                        return Err(TemporalParseError(
                            "interval start must not exceed end".to_string(),
                        ));
                    }
                }
                Ok(Self::Interval { start, end })
            }
        }
    }
}

/// Comparison operators usable in a property filter expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl std::fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Self::Eq => "=",
            Self::Neq => "<>",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
        };
        f.write_str(symbol)
    }
}

/// A CQL2-like property filter expression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterExpr {
    And(Vec<FilterExpr>),
    Or(Vec<FilterExpr>),
    Not(Box<FilterExpr>),
    Comparison {
        op: ComparisonOp,
        field: String,
        value: Value,
    },
    IsNull {
        field: String,
    },
    Like {
        field: String,
        pattern: String,
    },
    In {
        field: String,
        values: Vec<Value>,
    },
    Between {
        field: String,
        low: Value,
        high: Value,
    },
}

/// Sort direction for a single sort field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// A single entry in the sort specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// A normalized, validated STAC search request.
///
/// Empty `collections`/`ids` sets mean "no restriction", not "match
/// nothing". This mirrors the upstream STAC API behavior where omitting the
/// parameter and sending an empty list are treated the same way.
///
/// The limit is clamped to `[1, MAX_LIMIT]` at construction; requests never
/// carry an out-of-range page size.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub collections: Vec<String>,
    pub ids: Vec<String>,
    pub bbox: Option<Bbox>,
    pub intersects: Option<Geometry>,
    pub datetime: Option<TemporalFilter>,
    pub filter: Option<FilterExpr>,
    pub sortby: Vec<SortSpec>,
    pub limit: usize,
    pub token: Option<String>,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            collections: Vec::new(),
            ids: Vec::new(),
            bbox: None,
            intersects: None,
            datetime: None,
            filter: None,
            sortby: Vec::new(),
            limit: DEFAULT_LIMIT,
            token: None,
        }
    }
}

impl SearchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collections(mut self, collections: Vec<String>) -> Self {
        self.collections = collections;
        self
    }

    pub fn with_ids(mut self, ids: Vec<String>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_bbox(mut self, bbox: Bbox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    pub fn with_intersects(mut self, geometry: Geometry) -> Self {
        self.intersects = Some(geometry);
        self
    }

    pub fn with_datetime(mut self, datetime: TemporalFilter) -> Self {
        self.datetime = Some(datetime);
        self
    }

    pub fn with_filter(mut self, filter: FilterExpr) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_sortby(mut self, sortby: Vec<SortSpec>) -> Self {
        self.sortby = sortby;
        self
    }

    /// Set the page size, clamped to `[1, MAX_LIMIT]`.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.clamp(1, MAX_LIMIT);
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(SearchRequest::new().with_limit(0).limit, 1);
        assert_eq!(SearchRequest::new().with_limit(50).limit, 50);
        assert_eq!(SearchRequest::new().with_limit(10_000).limit, MAX_LIMIT);
        assert_eq!(SearchRequest::new().limit, DEFAULT_LIMIT);
    }

    #[test]
    fn test_bbox_from_six_coords_drops_elevation() {
        let bbox = Bbox::from_coords(&[-10.0, -10.0, 0.0, 10.0, 10.0, 100.0]).unwrap();
        assert_eq!(bbox, Bbox::new(-10.0, -10.0, 10.0, 10.0));
    }

    #[test]
    fn test_bbox_rejects_bad_shapes() {
        assert!(Bbox::from_coords(&[1.0, 2.0, 3.0]).is_err());
        assert!(Bbox::new(10.0, 0.0, -10.0, 5.0).validate().is_err());
        assert!(Bbox::new(0.0, 50.0, 10.0, 40.0).validate().is_err());
        assert!(Bbox::new(-200.0, 0.0, 10.0, 5.0).validate().is_err());
        assert!(Bbox::new(f64::NAN, 0.0, 10.0, 5.0).validate().is_err());
    }

    fn polygon(points: &[[f64; 2]]) -> Geometry {
        Geometry::Polygon {
            coordinates: vec![points.iter().map(|p| Position::new(p[0], p[1])).collect()],
        }
    }

    #[test]
    fn test_polygon_validation() {
        let valid = polygon(&[[6.0, 53.0], [7.0, 53.0], [7.0, 54.0], [6.0, 54.0], [6.0, 53.0]]);
        assert!(valid.validate().is_ok());

        let open = polygon(&[[6.0, 53.0], [7.0, 53.0], [7.0, 54.0], [6.0, 54.0]]);
        assert!(open.validate().is_err());

        // bowtie: edges cross in the middle
        let bowtie = polygon(&[[0.0, 0.0], [2.0, 2.0], [2.0, 0.0], [0.0, 2.0], [0.0, 0.0]]);
        assert!(bowtie.validate().is_err());
    }

    #[test]
    fn test_positions_accept_and_drop_elevation() {
        let geojson = serde_json::json!({
            "type": "Polygon",
            "coordinates": [[
                [6.0, 53.0, 120.5],
                [7.0, 53.0, 121.0],
                [7.0, 54.0, 119.0],
                [6.0, 54.0, 118.5],
                [6.0, 53.0, 120.5]
            ]]
        });

        let geometry: Geometry = serde_json::from_value(geojson).unwrap();
        assert!(geometry.validate().is_ok());
        assert_eq!(
            geometry,
            polygon(&[[6.0, 53.0], [7.0, 53.0], [7.0, 54.0], [6.0, 54.0], [6.0, 53.0]])
        );

        // serializes back as 2D positions
        let round_tripped = serde_json::to_value(&geometry).unwrap();
        assert_eq!(round_tripped["coordinates"][0][0], serde_json::json!([6.0, 53.0]));

        let too_short = serde_json::json!({
            "type": "Polygon",
            "coordinates": [[[6.0], [7.0], [7.0], [6.0]]]
        });
        assert!(serde_json::from_value::<Geometry>(too_short).is_err());
    }

    #[test]
    fn test_temporal_parse_instant() {
        let filter = TemporalFilter::parse("2020-01-01T00:00:00Z").unwrap();
        assert!(matches!(filter, TemporalFilter::Instant(_)));
    }

    #[test]
    fn test_temporal_parse_interval() {
        let filter =
            TemporalFilter::parse("2020-01-01T00:00:00Z/2020-12-31T23:59:59Z").unwrap();
        match filter {
            TemporalFilter::Interval { start, end } => {
                assert!(start.is_some());
                assert!(end.is_some());
            }
            other => panic!("expected interval, got {:?}", other),
        }
    }

    #[test]
    fn test_temporal_parse_open_bounds() {
        let filter = TemporalFilter::parse("../2020-12-31T23:59:59Z").unwrap();
        assert!(matches!(
            filter,
            TemporalFilter::Interval { start: None, end: Some(_) }
        ));

        let filter = TemporalFilter::parse("2020-01-01T00:00:00Z/..").unwrap();
        assert!(matches!(
            filter,
            TemporalFilter::Interval { start: Some(_), end: None }
        ));

        assert!(TemporalFilter::parse("../..").is_err());
    }

    #[test]
    fn test_temporal_parse_rejects_inverted_interval() {
        assert!(TemporalFilter::parse("2021-01-01T00:00:00Z/2020-01-01T00:00:00Z").is_err());
    }

    #[test]
    fn test_temporal_parse_rejects_garbage() {
        assert!(TemporalFilter::parse("yesterday").is_err());
    }
}
