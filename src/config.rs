// ⚙️ Configuration
// Map jobs, metric layout, provider and style settings (JSON on disk)

use crate::error::{MapError, Result};
use crate::figure::{ColorScheme, MapStyle, MAX_CANVAS_SIDE};
use crate::join::DuplicatePolicy;
use crate::metrics::MetricLayout;
use crate::render::output_path;
use crate::tracts::{normalize_fips, FeatureFields, COUNTY_WIDTH, DEFAULT_PAGE_SIZE, STATE_WIDTH};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ============================================================================
// SECTIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricSettings {
    /// Exact value of the metric-name column to keep
    pub name: String,
    /// Label for the title and legend (defaults to `name`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub layout: MetricLayout,
    /// Class → color table; when set the value column holds labels, not numbers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<ColorScheme>,
}

impl MetricSettings {
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

impl Default for MetricSettings {
    fn default() -> Self {
        MetricSettings {
            name: "Children in Poverty".to_string(),
            display_name: None,
            layout: MetricLayout::default(),
            categories: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub base_url: String,
    pub layer: u32,
    pub timeout_secs: u64,
    /// Features per request; larger states arrive over several pages
    pub page_size: u32,
    pub id_field: String,
    pub county_field: String,
    /// Read boundaries from this GeoJSON file instead of the web service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geojson_path: Option<PathBuf>,
}

impl ProviderSettings {
    pub fn fields(&self) -> FeatureFields {
        FeatureFields {
            id_field: self.id_field.clone(),
            county_field: self.county_field.clone(),
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        ProviderSettings {
            base_url: "https://tigerweb.geo.census.gov/arcgis/rest/services/TIGERweb".to_string(),
            layer: 6,
            timeout_secs: 120,
            page_size: DEFAULT_PAGE_SIZE,
            id_field: "GEOID".to_string(),
            county_field: "COUNTY".to_string(),
            geojson_path: None,
        }
    }
}

/// One map: a county of a state, a metric file, a label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapJob {
    pub label: String,
    pub state_fips: String,
    pub county_fips: String,
    pub metric_path: PathBuf,
    /// Explicit output file; derived from label + metric when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl MapJob {
    pub fn new(label: &str, state_fips: &str, county_fips: &str, metric_path: &str) -> Self {
        MapJob {
            label: label.to_string(),
            state_fips: state_fips.to_string(),
            county_fips: county_fips.to_string(),
            metric_path: PathBuf::from(metric_path),
            output: None,
        }
    }
}

// ============================================================================
// MAP CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Boundary reference year
    pub year: u16,
    pub metric: MetricSettings,
    pub provider: ProviderSettings,
    pub style: MapStyle,
    pub duplicate_policy: DuplicatePolicy,
    pub output_dir: PathBuf,
    /// Write `{stem}_unmatched.csv` next to each map
    pub write_unmatched: bool,
    pub jobs: Vec<MapJob>,
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfig {
            year: 2020,
            metric: MetricSettings::default(),
            provider: ProviderSettings::default(),
            style: MapStyle::default(),
            duplicate_policy: DuplicatePolicy::default(),
            output_dir: PathBuf::from("output"),
            write_unmatched: true,
            jobs: vec![
                MapJob::new("Detroit", "26", "163", "data/detroit_health.csv"),
                MapJob::new("Austin", "48", "453", "data/austin_health.csv"),
            ],
        }
    }
}

impl MapConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| MapError::io(path, e))?;
        let config: MapConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.jobs.is_empty() {
            return Err(MapError::Config("no map jobs configured".to_string()));
        }
        if self.style.width == 0 || self.style.height == 0 {
            return Err(MapError::Config("canvas size must be non-zero".to_string()));
        }
        if self.style.width > MAX_CANVAS_SIDE || self.style.height > MAX_CANVAS_SIDE {
            return Err(MapError::Config(format!(
                "canvas {}x{} exceeds {} pixels per side",
                self.style.width, self.style.height, MAX_CANVAS_SIDE
            )));
        }
        if self.metric.name.is_empty() {
            return Err(MapError::Config("metric name is empty".to_string()));
        }
        if self.provider.page_size == 0 {
            return Err(MapError::Config("provider page size must be non-zero".to_string()));
        }
        if let Some(scheme) = &self.metric.categories {
            scheme.validate()?;
        }

        for job in &self.jobs {
            let check = |code: &str, width: usize, what: &str| {
                normalize_fips(code, width).map_err(|e| {
                    MapError::Config(format!("job {:?}: bad {}: {}", job.label, what, e))
                })
            };
            check(&job.state_fips, STATE_WIDTH, "state FIPS")?;
            check(&job.county_fips, COUNTY_WIDTH, "county FIPS")?;
        }

        Ok(())
    }

    /// Where a job's PNG goes
    pub fn output_for(&self, job: &MapJob) -> PathBuf {
        job.output
            .clone()
            .unwrap_or_else(|| output_path(&self.output_dir, &job.label, &self.metric.name))
    }

    pub fn find_job(&self, label: &str) -> Option<&MapJob> {
        self.jobs
            .iter()
            .find(|j| j.label.eq_ignore_ascii_case(label))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::Rgb;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = MapConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.jobs.len(), 2);
        assert_eq!(config.metric.display_name(), "Children in Poverty");
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Reject);
    }

    #[test]
    fn test_json_round_trip() {
        let config = MapConfig::default();
        let json = config.to_json().unwrap();
        let parsed: MapConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r##"{
            "metric": {"name": "Children in Poverty", "display_name": "Children in Poverty (%)"},
            "style": {"missing_color": "#cccccc"},
            "duplicate_policy": "keep_first",
            "jobs": [{"label": "Austin", "state_fips": "48", "county_fips": "453", "metric_path": "austin.csv"}]
        }"##;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = MapConfig::load(file.path()).unwrap();
        assert_eq!(config.year, 2020);
        assert_eq!(config.metric.display_name(), "Children in Poverty (%)");
        assert_eq!(config.metric.layout.id_column, "geo_fips");
        assert_eq!(config.style.missing_color, Rgb(0xcc, 0xcc, 0xcc));
        assert_eq!(config.style.width, 1500);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::KeepFirst);
        assert_eq!(config.jobs.len(), 1);
    }

    #[test]
    fn test_validate_rejects_bad_fips() {
        let mut config = MapConfig::default();
        config.jobs[0].county_fips = "Wayne".to_string();
        assert!(matches!(config.validate(), Err(MapError::Config(_))));

        let mut config = MapConfig::default();
        config.jobs[1].state_fips = "480".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_caps_canvas_size() {
        let mut config = MapConfig::default();
        config.style.width = 40_000;
        config.style.height = 40_000;
        assert!(matches!(config.validate(), Err(MapError::Config(_))));

        config.style.width = MAX_CANVAS_SIDE;
        config.style.height = MAX_CANVAS_SIDE;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_categories_from_json() {
        let json = r##"{
            "metric": {
                "name": "COMP_RANK",
                "display_name": "Opportunity Rankings",
                "categories": {
                    "title": "Opportunity Rankings",
                    "classes": [
                        {"value": "1", "label": "High Opportunity Area", "color": "#2ecc71"},
                        {"value": "2", "label": "Medium Opportunity Area", "color": "#f1c40f"},
                        {"value": "3", "label": "Low Opportunity Area", "color": "#e74c3c"}
                    ],
                    "unknown_color": "#ffffff"
                }
            }
        }"##;
        let config: MapConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.metric.categories, Some(ColorScheme::opportunity_rankings()));

        let mut config = config;
        if let Some(scheme) = config.metric.categories.as_mut() {
            scheme.classes.clear();
        }
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_jobs() {
        let config = MapConfig {
            jobs: Vec::new(),
            ..MapConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_output_for_job() {
        let mut config = MapConfig::default();
        assert_eq!(
            config.output_for(&config.jobs[0]),
            PathBuf::from("output/Detroit_children_in_poverty.png")
        );

        config.jobs[1].output = Some(PathBuf::from("maps/austin.png"));
        assert_eq!(config.output_for(&config.jobs[1]), PathBuf::from("maps/austin.png"));
    }

    #[test]
    fn test_find_job_case_insensitive() {
        let config = MapConfig::default();
        assert_eq!(config.find_job("austin").map(|j| j.state_fips.as_str()), Some("48"));
        assert!(config.find_job("Houston").is_none());
    }
}
