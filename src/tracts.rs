// 🗺️ Tract Loader
// Fetches census tract boundaries and normalizes their GEOIDs

use crate::error::{MapError, Result};
use chrono::{DateTime, Utc};
use geo::MultiPolygon;
use geojson::GeoJson;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Width of a tract GEOID: state (2) + county (3) + tract (6)
pub const GEOID_WIDTH: usize = 11;

/// Width of a state FIPS code
pub const STATE_WIDTH: usize = 2;

/// Width of a county FIPS code
pub const COUNTY_WIDTH: usize = 3;

/// Features requested per TIGERweb page (the service caps responses at its maxRecordCount)
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

// ============================================================================
// IDENTIFIERS
// ============================================================================

/// Canonical tract identifier: always 11 ASCII digits, leading zeros kept.
///
/// Census ids that went through a numeric column (`6075010100`, `6075010100.0`)
/// are padded back to their fixed width so they compare equal to the string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TractId(String);

impl TractId {
    pub fn parse(raw: &str) -> Result<Self> {
        normalize_fips(raw, GEOID_WIDTH).map(TractId)
    }

    /// Accepts the string or numeric forms a JSON property can take
    pub fn from_json(value: &Value) -> Result<Self> {
        fips_from_json(value, GEOID_WIDTH).map(TractId)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Two-digit state code
    pub fn state_code(&self) -> &str {
        &self.0[..2]
    }

    /// Three-digit county code
    pub fn county_code(&self) -> &str {
        &self.0[2..5]
    }
}

impl fmt::Display for TractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TractId {
    type Error = MapError;

    fn try_from(value: String) -> Result<Self> {
        TractId::parse(&value)
    }
}

impl From<TractId> for String {
    fn from(id: TractId) -> Self {
        id.0
    }
}

/// Normalize a FIPS-style code to a fixed-width digit string.
pub fn normalize_fips(raw: &str, width: usize) -> Result<String> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_suffix(".0").unwrap_or(trimmed);

    if digits.is_empty() {
        return Err(invalid(raw, "empty identifier"));
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(raw, "identifier must contain only digits"));
    }
    if digits.len() > width {
        return Err(invalid(
            raw,
            &format!("identifier is longer than {} digits", width),
        ));
    }

    Ok(format!("{:0>width$}", digits, width = width))
}

pub fn fips_from_json(value: &Value, width: usize) -> Result<String> {
    match value {
        Value::String(s) => normalize_fips(s, width),
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                normalize_fips(&u.to_string(), width)
            } else if let Some(f) = n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0) {
                normalize_fips(&format!("{:.0}", f), width)
            } else {
                Err(invalid(&n.to_string(), "identifier is not a whole number"))
            }
        }
        other => Err(invalid(&other.to_string(), "identifier is not a string or number")),
    }
}

fn invalid(value: &str, reason: &str) -> MapError {
    MapError::InvalidIdentifier {
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

// ============================================================================
// TRACT RECORD
// ============================================================================

/// One census tract: identity, county, boundary and provider properties
#[derive(Debug, Clone)]
pub struct Tract {
    pub id: TractId,
    pub county_code: String,
    pub geometry: MultiPolygon<f64>,
    pub metadata: HashMap<String, Value>,
}

impl Tract {
    pub fn new(id: TractId, county_code: String, geometry: MultiPolygon<f64>) -> Self {
        Tract {
            id,
            county_code,
            geometry,
            metadata: HashMap::new(),
        }
    }

    /// Record where and when this boundary came from
    pub fn set_provenance(&mut self, provider: &str, fetched_at: DateTime<Utc>) {
        self.metadata
            .insert("provider".to_string(), serde_json::json!(provider));
        self.metadata.insert(
            "fetched_at".to_string(),
            serde_json::json!(fetched_at.to_rfc3339()),
        );
    }

    pub fn get_metadata(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }
}

// ============================================================================
// PROVIDERS
// ============================================================================

/// Source of tract boundaries for a region (state) code
pub trait BoundaryProvider {
    /// Short name used in provenance and logs
    fn name(&self) -> &str;

    /// Fetch every tract in the region. One best-effort attempt per request, no retries.
    fn fetch(&self, region_code: &str) -> Result<Vec<Tract>>;
}

/// Property names used to pull the join key and county out of a feature
#[derive(Debug, Clone)]
pub struct FeatureFields {
    pub id_field: String,
    pub county_field: String,
}

impl Default for FeatureFields {
    fn default() -> Self {
        FeatureFields {
            id_field: "GEOID".to_string(),
            county_field: "COUNTY".to_string(),
        }
    }
}

/// Census TIGERweb ArcGIS REST service
pub struct TigerWebProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    year: u16,
    layer: u32,
    page_size: u32,
    fields: FeatureFields,
}

impl TigerWebProvider {
    pub fn new(
        base_url: &str,
        year: u16,
        layer: u32,
        fields: FeatureFields,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tract-choropleth/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(TigerWebProvider {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            year,
            layer,
            page_size: DEFAULT_PAGE_SIZE,
            fields,
        })
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Query URL for one page of the tracts in a state, ordered by GEOID
    pub fn query_url(&self, region_code: &str, offset: usize) -> Result<reqwest::Url> {
        let endpoint = format!(
            "{}/tigerWMS_Census{}/MapServer/{}/query",
            self.base_url, self.year, self.layer
        );
        let state = normalize_fips(region_code, STATE_WIDTH)?;
        let filter = format!("STATE='{}'", state);
        let offset = offset.to_string();
        let count = self.page_size.to_string();

        reqwest::Url::parse_with_params(
            &endpoint,
            &[
                ("where", filter.as_str()),
                ("outFields", "*"),
                ("outSR", "4326"),
                ("returnGeometry", "true"),
                ("orderByFields", self.fields.id_field.as_str()),
                ("resultOffset", offset.as_str()),
                ("resultRecordCount", count.as_str()),
                ("f", "geojson"),
            ],
        )
        .map_err(|e| MapError::Provider(format!("invalid query URL {}: {}", endpoint, e)))
    }

    fn get_page(&self, url: reqwest::Url) -> Result<FeaturePage> {
        tracing::debug!(%url, "requesting tract boundaries");

        let response = self.client.get(url).send()?;
        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            return Err(MapError::Provider(format!(
                "status {}: {}",
                status.as_u16(),
                truncate(&body, 200)
            )));
        }

        parse_feature_page(&body, &self.fields)
    }
}

impl BoundaryProvider for TigerWebProvider {
    fn name(&self) -> &str {
        "tigerweb"
    }

    fn fetch(&self, region_code: &str) -> Result<Vec<Tract>> {
        let mut tracts = Vec::new();

        // Keep asking until the service stops flagging a truncated response
        loop {
            let page = self.get_page(self.query_url(region_code, tracts.len())?)?;
            let received = page.tracts.len();
            tracts.extend(page.tracts);

            if !page.exceeded_transfer_limit {
                break;
            }
            if received == 0 {
                return Err(MapError::Provider(format!(
                    "service reported more tracts after {} but returned an empty page",
                    tracts.len()
                )));
            }
            tracing::debug!(fetched = tracts.len(), "more tracts pending");
        }

        Ok(tracts)
    }
}

/// Pre-downloaded GeoJSON FeatureCollection on disk
pub struct GeoJsonFileProvider {
    path: PathBuf,
    fields: FeatureFields,
}

impl GeoJsonFileProvider {
    pub fn new(path: impl Into<PathBuf>, fields: FeatureFields) -> Self {
        GeoJsonFileProvider {
            path: path.into(),
            fields,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BoundaryProvider for GeoJsonFileProvider {
    fn name(&self) -> &str {
        "geojson-file"
    }

    fn fetch(&self, region_code: &str) -> Result<Vec<Tract>> {
        let body = std::fs::read_to_string(&self.path)
            .map_err(|e| MapError::io(&self.path, e))?;

        let state = normalize_fips(region_code, STATE_WIDTH)?;
        let tracts = parse_feature_collection(&body, &self.fields)?;

        Ok(tracts
            .into_iter()
            .filter(|t| t.id.state_code() == state)
            .collect())
    }
}

// ============================================================================
// LOADING
// ============================================================================

/// Fetch the tracts for a region and stamp provenance on each one.
/// Unpadded state codes ("6") are widened to their two-digit form first.
pub fn get_tracts(provider: &dyn BoundaryProvider, region_code: &str) -> Result<Vec<Tract>> {
    let region = normalize_fips(region_code, STATE_WIDTH)?;
    let region_code = region.as_str();
    tracing::info!(provider = provider.name(), region = region_code, "downloading census tracts");

    let mut tracts = provider.fetch(region_code)?;
    let fetched_at = Utc::now();
    for tract in &mut tracts {
        tract.set_provenance(provider.name(), fetched_at);
    }

    tracing::info!(count = tracts.len(), region = region_code, "tracts loaded");
    Ok(tracts)
}

/// Keep the tracts of one county, preserving order
pub fn filter_county(tracts: &[Tract], county_code: &str) -> Result<Vec<Tract>> {
    let county = normalize_fips(county_code, COUNTY_WIDTH)?;
    let kept: Vec<Tract> = tracts
        .iter()
        .filter(|t| t.county_code == county)
        .cloned()
        .collect();

    tracing::debug!(county = %county, kept = kept.len(), total = tracts.len(), "county filter");
    Ok(kept)
}

// ============================================================================
// GEOJSON DECODING
// ============================================================================

/// One provider response: its tracts and whether the service held some back
#[derive(Debug)]
pub struct FeaturePage {
    pub tracts: Vec<Tract>,
    pub exceeded_transfer_limit: bool,
}

/// Decode a complete FeatureCollection into tracts. A response the service
/// truncated at its record limit is an error, not a partial result.
pub fn parse_feature_collection(body: &str, fields: &FeatureFields) -> Result<Vec<Tract>> {
    let page = parse_feature_page(body, fields)?;
    if page.exceeded_transfer_limit {
        return Err(MapError::Provider(format!(
            "feature collection was truncated after {} tracts (exceededTransferLimit)",
            page.tracts.len()
        )));
    }
    Ok(page.tracts)
}

/// Decode one page of a provider response
pub fn parse_feature_page(body: &str, fields: &FeatureFields) -> Result<FeaturePage> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| MapError::Geometry(format!("response is not JSON: {}", e)))?;

    // ArcGIS reports failures as 200 + {"error": {...}}
    if let Some(error) = value.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(MapError::Provider(message.to_string()));
    }

    // Plain ArcGIS JSON puts the flag at the top level, f=geojson under "properties"
    let exceeded_transfer_limit = [
        value.get("exceededTransferLimit"),
        value.pointer("/properties/exceededTransferLimit"),
    ]
    .into_iter()
    .flatten()
    .any(|flag| flag.as_bool() == Some(true));

    let collection = match GeoJson::from_json_value(value)? {
        GeoJson::FeatureCollection(fc) => fc,
        _ => {
            return Err(MapError::Geometry(
                "expected a GeoJSON FeatureCollection".to_string(),
            ))
        }
    };

    let mut tracts = Vec::with_capacity(collection.features.len());
    for (index, feature) in collection.features.into_iter().enumerate() {
        let properties = feature.properties.unwrap_or_default();

        let raw_id = properties.get(&fields.id_field).ok_or_else(|| {
            MapError::Geometry(format!(
                "feature {} has no {} property",
                index, fields.id_field
            ))
        })?;
        let id = TractId::from_json(raw_id)?;

        let county_code = match properties.get(&fields.county_field) {
            Some(raw) if !raw.is_null() => fips_from_json(raw, COUNTY_WIDTH)?,
            _ => id.county_code().to_string(),
        };

        let geometry = feature.geometry.ok_or_else(|| {
            MapError::Geometry(format!("tract {} has no geometry", id))
        })?;
        let geometry = to_multi_polygon(geometry, &id)?;

        let mut tract = Tract::new(id, county_code, geometry);
        tract.metadata = properties.into_iter().collect();
        tracts.push(tract);
    }

    Ok(FeaturePage {
        tracts,
        exceeded_transfer_limit,
    })
}

fn to_multi_polygon(geometry: geojson::Geometry, id: &TractId) -> Result<MultiPolygon<f64>> {
    match geo::Geometry::<f64>::try_from(geometry)? {
        geo::Geometry::Polygon(p) => Ok(MultiPolygon::new(vec![p])),
        geo::Geometry::MultiPolygon(mp) => Ok(mp),
        other => Err(MapError::Geometry(format!(
            "tract {} has unsupported geometry {}",
            id,
            geometry_kind(&other)
        ))),
    }
}

fn geometry_kind(geometry: &geo::Geometry<f64>) -> &'static str {
    match geometry {
        geo::Geometry::Point(_) => "Point",
        geo::Geometry::Line(_) => "Line",
        geo::Geometry::LineString(_) => "LineString",
        geo::Geometry::MultiPoint(_) => "MultiPoint",
        geo::Geometry::MultiLineString(_) => "MultiLineString",
        geo::Geometry::GeometryCollection(_) => "GeometryCollection",
        geo::Geometry::Rect(_) => "Rect",
        geo::Geometry::Triangle(_) => "Triangle",
        geo::Geometry::Polygon(_) => "Polygon",
        geo::Geometry::MultiPolygon(_) => "MultiPolygon",
    }
}

fn truncate(s: &str, max_len: usize) -> &str {
    match s.char_indices().nth(max_len) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"GEOID": "26163500100", "STATE": "26", "COUNTY": "163", "NAME": "5001"},
                "geometry": {"type": "Polygon", "coordinates": [[[-83.1, 42.3], [-83.0, 42.3], [-83.0, 42.4], [-83.1, 42.3]]]}
            },
            {
                "type": "Feature",
                "properties": {"GEOID": 6075010100, "COUNTY": 75},
                "geometry": {"type": "MultiPolygon", "coordinates": [[[[-122.4, 37.7], [-122.3, 37.7], [-122.3, 37.8], [-122.4, 37.7]]]]}
            },
            {
                "type": "Feature",
                "properties": {"GEOID": "26099400100"},
                "geometry": {"type": "Polygon", "coordinates": [[[-82.9, 42.5], [-82.8, 42.5], [-82.8, 42.6], [-82.9, 42.5]]]}
            }
        ]
    }"#;

    #[test]
    fn test_normalize_fips_pads_leading_zeros() {
        assert_eq!(normalize_fips("6075010100", 11).unwrap(), "06075010100");
        assert_eq!(normalize_fips("06075010100", 11).unwrap(), "06075010100");
        assert_eq!(normalize_fips(" 163 ", 3).unwrap(), "163");
        assert_eq!(normalize_fips("75", 3).unwrap(), "075");
    }

    #[test]
    fn test_normalize_fips_strips_float_suffix() {
        assert_eq!(normalize_fips("6075010100.0", 11).unwrap(), "06075010100");
    }

    #[test]
    fn test_normalize_fips_rejects_garbage() {
        assert!(normalize_fips("", 11).is_err());
        assert!(normalize_fips("48-453", 11).is_err());
        assert!(normalize_fips("484530001001", 11).is_err());
        assert!(normalize_fips("6.075e9", 11).is_err());
    }

    #[test]
    fn test_tract_id_from_json_number() {
        let id = TractId::from_json(&serde_json::json!(6075010100u64)).unwrap();
        assert_eq!(id.as_str(), "06075010100");
        assert_eq!(id.state_code(), "06");
        assert_eq!(id.county_code(), "075");

        let id = TractId::from_json(&serde_json::json!(48453000100.0)).unwrap();
        assert_eq!(id.as_str(), "48453000100");

        assert!(TractId::from_json(&serde_json::json!(true)).is_err());
        assert!(TractId::from_json(&serde_json::json!(1.5)).is_err());
    }

    #[test]
    fn test_tract_id_string_and_numeric_forms_compare_equal() {
        let from_string = TractId::parse("06075010100").unwrap();
        let from_number = TractId::from_json(&serde_json::json!(6075010100u64)).unwrap();
        assert_eq!(from_string, from_number);
    }

    #[test]
    fn test_parse_feature_collection() {
        let tracts = parse_feature_collection(SAMPLE, &FeatureFields::default()).unwrap();

        assert_eq!(tracts.len(), 3);
        assert_eq!(tracts[0].id.as_str(), "26163500100");
        assert_eq!(tracts[0].county_code, "163");
        assert_eq!(tracts[0].geometry.0.len(), 1);
        assert_eq!(
            tracts[0].get_metadata("NAME"),
            Some(&serde_json::json!("5001"))
        );

        // Numeric GEOID and county survive with their zeros
        assert_eq!(tracts[1].id.as_str(), "06075010100");
        assert_eq!(tracts[1].county_code, "075");

        // Missing county property falls back to the GEOID digits
        assert_eq!(tracts[2].county_code, "099");
    }

    #[test]
    fn test_parse_feature_collection_reports_arcgis_error() {
        let body = r#"{"error": {"code": 400, "message": "Invalid query parameters"}}"#;
        let err = parse_feature_collection(body, &FeatureFields::default()).unwrap_err();

        match err {
            MapError::Provider(msg) => assert_eq!(msg, "Invalid query parameters"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_feature_collection_rejects_points() {
        let body = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"GEOID": "48453000100"},
             "geometry": {"type": "Point", "coordinates": [-97.7, 30.2]}}
        ]}"#;

        assert!(matches!(
            parse_feature_collection(body, &FeatureFields::default()),
            Err(MapError::Geometry(_))
        ));
    }

    #[test]
    fn test_parse_feature_collection_rejects_malformed_body() {
        assert!(parse_feature_collection("<html>", &FeatureFields::default()).is_err());
        assert!(parse_feature_collection(
            r#"{"type": "Point", "coordinates": [0.0, 0.0]}"#,
            &FeatureFields::default()
        )
        .is_err());
    }

    #[test]
    fn test_filter_county_exact_match() {
        let tracts = parse_feature_collection(SAMPLE, &FeatureFields::default()).unwrap();

        let wayne = filter_county(&tracts, "163").unwrap();
        assert_eq!(wayne.len(), 1);
        assert_eq!(wayne[0].id.as_str(), "26163500100");

        // Unpadded county codes are normalized before comparing
        let sf = filter_county(&tracts, "75").unwrap();
        assert_eq!(sf.len(), 1);

        assert!(filter_county(&tracts, "999").unwrap().is_empty());
    }

    #[test]
    fn test_geojson_file_provider_filters_by_state() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let provider = GeoJsonFileProvider::new(file.path(), FeatureFields::default());
        let tracts = get_tracts(&provider, "26").unwrap();

        assert_eq!(tracts.len(), 2);
        assert!(tracts.iter().all(|t| t.id.state_code() == "26"));
        assert_eq!(
            tracts[0].get_metadata("provider"),
            Some(&serde_json::json!("geojson-file"))
        );
        assert!(tracts[0].get_metadata("fetched_at").is_some());
    }

    #[test]
    fn test_geojson_file_provider_missing_file() {
        let provider = GeoJsonFileProvider::new("/nonexistent/tracts.geojson", FeatureFields::default());
        assert!(matches!(provider.fetch("26"), Err(MapError::Io { .. })));
    }

    #[test]
    fn test_tigerweb_query_url() {
        let provider = TigerWebProvider::new(
            "https://tigerweb.geo.census.gov/arcgis/rest/services/TIGERweb/",
            2020,
            6,
            FeatureFields::default(),
            Duration::from_secs(5),
        )
        .unwrap();

        let url = provider.query_url("48", 0).unwrap();
        assert_eq!(
            url.path(),
            "/arcgis/rest/services/TIGERweb/tigerWMS_Census2020/MapServer/6/query"
        );

        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(params["where"], "STATE='48'");
        assert_eq!(params["f"], "geojson");
        assert_eq!(params["outSR"], "4326");
        assert_eq!(params["orderByFields"], "GEOID");
        assert_eq!(params["resultOffset"], "0");
        assert_eq!(params["resultRecordCount"], "1000");
    }

    #[test]
    fn test_tigerweb_query_url_pages_and_pads_state() {
        let provider = TigerWebProvider::new(
            "https://tigerweb.geo.census.gov/arcgis/rest/services/TIGERweb",
            2020,
            6,
            FeatureFields::default(),
            Duration::from_secs(5),
        )
        .unwrap()
        .with_page_size(250);

        let url = provider.query_url("6", 500).unwrap();
        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(params["where"], "STATE='06'");
        assert_eq!(params["resultOffset"], "500");
        assert_eq!(params["resultRecordCount"], "250");

        assert!(provider.query_url("CA", 0).is_err());
    }

    #[test]
    fn test_truncated_response_is_flagged() {
        let body = r#"{
            "type": "FeatureCollection",
            "properties": {"exceededTransferLimit": true},
            "features": [
                {"type": "Feature", "properties": {"GEOID": "48453000100"},
                 "geometry": {"type": "Polygon", "coordinates": [[[-97.8, 30.2], [-97.7, 30.2], [-97.7, 30.3], [-97.8, 30.2]]]}}
            ]
        }"#;

        let page = parse_feature_page(body, &FeatureFields::default()).unwrap();
        assert!(page.exceeded_transfer_limit);
        assert_eq!(page.tracts.len(), 1);

        // Callers expecting a whole collection get an error instead of silently missing tracts
        assert!(matches!(
            parse_feature_collection(body, &FeatureFields::default()),
            Err(MapError::Provider(_))
        ));

        let top_level = body.replacen(
            r#""properties": {"exceededTransferLimit": true},"#,
            r#""exceededTransferLimit": true,"#,
            1,
        );
        assert!(parse_feature_page(&top_level, &FeatureFields::default())
            .unwrap()
            .exceeded_transfer_limit);

        let complete = parse_feature_page(SAMPLE, &FeatureFields::default()).unwrap();
        assert!(!complete.exceeded_transfer_limit);
    }

    #[test]
    fn test_get_tracts_pads_state_code() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let provider = GeoJsonFileProvider::new(file.path(), FeatureFields::default());
        let tracts = get_tracts(&provider, "6").unwrap();

        assert_eq!(tracts.len(), 1);
        assert_eq!(tracts[0].id.as_str(), "06075010100");
        assert!(get_tracts(&provider, "California").is_err());
    }
}
