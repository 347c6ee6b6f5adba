// 🎨 Figure Builder
// Turns joined tracts into a render-ready choropleth description (no I/O)

use crate::error::MapError;
use crate::join::JoinedRecord;
use geo::{Area, BoundingRect, LineString, Rect};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

// ============================================================================
// COLORS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const LIGHT_GREY: Rgb = Rgb(211, 211, 211);

    /// Parse `#rrggbb`
    pub fn from_hex(hex: &str) -> Result<Self, MapError> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(MapError::Config(format!("invalid color {:?}", hex)));
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16);
        match (channel(0), channel(2), channel(4)) {
            (Ok(r), Ok(g), Ok(b)) => Ok(Rgb(r, g, b)),
            _ => Err(MapError::Config(format!("invalid color {:?}", hex))),
        }
    }

    fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl TryFrom<String> for Rgb {
    type Error = MapError;

    fn try_from(value: String) -> Result<Self, MapError> {
        Rgb::from_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_string()
    }
}

/// Continuous color scale, linear between fixed stops
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    stops: Vec<(f64, Rgb)>,
}

impl ColorScale {
    /// Perceptually uniform viridis, sampled at nine stops
    pub fn viridis() -> Self {
        ColorScale {
            stops: vec![
                (0.0, Rgb(68, 1, 84)),
                (0.125, Rgb(71, 44, 122)),
                (0.25, Rgb(59, 81, 139)),
                (0.375, Rgb(44, 113, 142)),
                (0.5, Rgb(33, 144, 141)),
                (0.625, Rgb(39, 173, 129)),
                (0.75, Rgb(92, 200, 99)),
                (0.875, Rgb(170, 220, 50)),
                (1.0, Rgb(253, 231, 37)),
            ],
        }
    }

    /// Color at position `t`, clamped to [0, 1]
    pub fn color_at(&self, t: f64) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        for pair in self.stops.windows(2) {
            let (t0, c0) = pair[0];
            let (t1, c1) = pair[1];
            if t <= t1 {
                let span = t1 - t0;
                let local = if span > 0.0 { (t - t0) / span } else { 0.0 };
                return c0.lerp(c1, local);
            }
        }

        self.stops.last().map(|(_, c)| *c).unwrap_or(Rgb::BLACK)
    }
}

// ============================================================================
// CATEGORIES
// ============================================================================

/// One class of a categorical map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryClass {
    /// Cell value this class matches ("1" also matches "1.0")
    pub value: String,
    pub label: String,
    pub color: Rgb,
}

impl CategoryClass {
    pub fn new(value: &str, label: &str, color: Rgb) -> Self {
        CategoryClass {
            value: value.to_string(),
            label: label.to_string(),
            color,
        }
    }

    fn matches(&self, category: &str) -> bool {
        let category = category.trim();
        if self.value == category {
            return true;
        }
        match (self.value.trim().parse::<f64>(), category.parse::<f64>()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

/// Fixed category → color mapping with a patch legend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorScheme {
    /// Legend title
    pub title: String,
    pub classes: Vec<CategoryClass>,
    /// Fill for tracts whose category is missing or not listed
    pub unknown_color: Rgb,
    /// Listed in the legend when set
    #[serde(default)]
    pub unknown_label: Option<String>,
}

impl ColorScheme {
    /// Ranks 1-3, high to low opportunity
    pub fn opportunity_rankings() -> Self {
        ColorScheme {
            title: "Opportunity Rankings".to_string(),
            classes: vec![
                CategoryClass::new("1", "High Opportunity Area", Rgb(46, 204, 113)),
                CategoryClass::new("2", "Medium Opportunity Area", Rgb(241, 196, 15)),
                CategoryClass::new("3", "Low Opportunity Area", Rgb(231, 76, 60)),
            ],
            unknown_color: Rgb::WHITE,
            unknown_label: None,
        }
    }

    /// Dominant group codes as written by the PL 94-171 demographic summary
    pub fn dominant_race() -> Self {
        ColorScheme {
            title: "Dominant Race/Ethnicity".to_string(),
            classes: vec![
                CategoryClass::new("white_nh", "White (Non-Hispanic)", Rgb(255, 182, 193)),
                CategoryClass::new("black_alone", "Black/African American", Rgb(135, 206, 235)),
                CategoryClass::new("asian_alone", "Asian", Rgb(152, 251, 152)),
                CategoryClass::new("hispanic", "Hispanic/Latino", Rgb(221, 160, 221)),
                CategoryClass::new("aian_alone", "American Indian/Alaska Native", Rgb(240, 230, 140)),
                CategoryClass::new("nhpi_alone", "Native Hawaiian/Pacific Islander", Rgb(255, 160, 122)),
                CategoryClass::new("other_alone", "Other Race", Rgb::LIGHT_GREY),
            ],
            unknown_color: Rgb::WHITE,
            unknown_label: Some("Unknown".to_string()),
        }
    }

    pub fn class_for(&self, category: Option<&str>) -> Option<&CategoryClass> {
        let category = category?;
        self.classes.iter().find(|c| c.matches(category))
    }

    /// Legend entries in class order, unknown last
    pub fn patches(&self) -> Vec<LegendPatch> {
        let mut patches: Vec<LegendPatch> = self
            .classes
            .iter()
            .map(|c| LegendPatch {
                color: c.color,
                label: c.label.clone(),
            })
            .collect();
        if let Some(label) = &self.unknown_label {
            patches.push(LegendPatch {
                color: self.unknown_color,
                label: label.clone(),
            });
        }
        patches
    }

    pub fn validate(&self) -> Result<(), MapError> {
        if self.classes.is_empty() {
            return Err(MapError::Config("color scheme has no classes".to_string()));
        }
        for (i, class) in self.classes.iter().enumerate() {
            if self.classes[..i].iter().any(|c| c.matches(&class.value)) {
                return Err(MapError::Config(format!(
                    "color scheme lists category {:?} twice",
                    class.value
                )));
            }
        }
        Ok(())
    }
}

/// How tracts get their colors
#[derive(Debug, Clone, PartialEq)]
pub enum ColorMode {
    /// Numeric values on a continuous scale with a colorbar
    Continuous(ColorScale),
    /// Class labels looked up in a fixed scheme
    Categorical(ColorScheme),
}

// ============================================================================
// VALUE RANGE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    /// Range over finite values; `None` when there are none
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |range: Option<ValueRange>, v| match range {
                None => Some(ValueRange { min: v, max: v }),
                Some(r) => Some(ValueRange {
                    min: r.min.min(v),
                    max: r.max.max(v),
                }),
            })
    }

    /// Position of `value` in the range; a single-valued range maps to the middle
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            0.5
        } else {
            (value - self.min) / span
        }
    }

    /// Up to `count` evenly spaced tick values, min and max included
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        if count == 0 {
            return Vec::new();
        }
        if self.max <= self.min || count == 1 {
            return vec![self.min];
        }
        let step = (self.max - self.min) / (count - 1) as f64;
        (0..count).map(|i| self.min + step * i as f64).collect()
    }
}

// ============================================================================
// LAYOUT
// ============================================================================

/// Axis-aligned pixel rectangle (origin top-left, y down)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn contains(&self, (px, py): (f64, f64)) -> bool {
        px >= self.x - 1e-6
            && px <= self.right() + 1e-6
            && py >= self.y - 1e-6
            && py <= self.bottom() + 1e-6
    }
}

/// Equirectangular lon/lat → pixel projection fitted to an area
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    x_scale: f64,
    scale: f64,
    origin_x: f64,
    origin_y: f64,
    offset_x: f64,
    offset_y: f64,
}

impl Projection {
    /// Fit `bounds` into `area`, preserving aspect ratio and centering
    pub fn fit(bounds: Option<Rect<f64>>, area: PixelRect) -> Self {
        let Some(bounds) = bounds else {
            return Projection {
                x_scale: 1.0,
                scale: 1.0,
                origin_x: 0.0,
                origin_y: 0.0,
                offset_x: area.x + area.width / 2.0,
                offset_y: area.y + area.height / 2.0,
            };
        };

        let mid_lat = (bounds.min().y + bounds.max().y) / 2.0;
        let x_scale = mid_lat.to_radians().cos().abs().max(1e-6);

        let geo_width = bounds.width() * x_scale;
        let geo_height = bounds.height();

        let scale = match (geo_width > 0.0, geo_height > 0.0) {
            (true, true) => (area.width / geo_width).min(area.height / geo_height),
            (true, false) => area.width / geo_width,
            (false, true) => area.height / geo_height,
            (false, false) => 1.0,
        };

        Projection {
            x_scale,
            scale,
            origin_x: bounds.min().x,
            origin_y: bounds.max().y,
            offset_x: area.x + (area.width - geo_width * scale) / 2.0,
            offset_y: area.y + (area.height - geo_height * scale) / 2.0,
        }
    }

    pub fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        (
            self.offset_x + (lon - self.origin_x) * self.x_scale * self.scale,
            self.offset_y + (self.origin_y - lat) * self.scale,
        )
    }

    fn project_ring(&self, ring: &LineString<f64>) -> Vec<(f64, f64)> {
        ring.coords().map(|c| self.project(c.x, c.y)).collect()
    }
}

// ============================================================================
// FIGURE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillKind {
    Value,
    Missing,
    /// Polygon interior ring painted in the background color
    Hole,
}

#[derive(Debug, Clone)]
pub struct FillLayer {
    /// Index into `Figure::tracts`
    pub tract: usize,
    pub ring: Vec<(f64, f64)>,
    pub color: Rgb,
    pub kind: FillKind,
}

#[derive(Debug, Clone)]
pub struct FigureTract {
    pub id: String,
    pub value: Option<f64>,
    pub has_value: bool,
    pub color: Rgb,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Rgb,
    pub width: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendPatch {
    pub color: Rgb,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct Colorbar {
    pub scale: ColorScale,
    pub range: Option<ValueRange>,
    /// (value, formatted label)
    pub ticks: Vec<(f64, String)>,
}

#[derive(Debug, Clone)]
pub struct Legend {
    pub label: String,
    /// Colorbar rectangle; patches stack below it (or from its top without one)
    pub area: PixelRect,
    pub colorbar: Option<Colorbar>,
    pub patches: Vec<LegendPatch>,
}

impl Legend {
    /// Vertical pixel position of a value on the colorbar (max at the top)
    pub fn bar_y(&self, value: f64) -> f64 {
        let t = self
            .colorbar
            .as_ref()
            .and_then(|c| c.range)
            .map_or(0.5, |r| r.normalize(value));
        self.area.bottom() - t.clamp(0.0, 1.0) * self.area.height
    }

    /// Top edge of the first patch swatch
    pub fn patch_top(&self) -> f64 {
        match self.colorbar {
            Some(_) => self.area.bottom() + 30.0,
            None => self.area.y,
        }
    }

    pub fn range(&self) -> Option<ValueRange> {
        self.colorbar.as_ref().and_then(|c| c.range)
    }
}

/// Everything needed to draw a map, in pixel space
#[derive(Debug, Clone)]
pub struct Figure {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub title_font_size: u32,
    pub background: Rgb,
    pub map_area: PixelRect,
    pub tracts: Vec<FigureTract>,
    /// Painted in order, back to front
    pub fills: Vec<FillLayer>,
    /// Every ring of every tract, drawn over the fills
    pub outlines: Vec<Vec<(f64, f64)>>,
    pub outline: Stroke,
    pub legend: Legend,
}

impl Figure {
    pub fn valued_count(&self) -> usize {
        self.tracts.iter().filter(|t| t.has_value).count()
    }

    pub fn missing_count(&self) -> usize {
        self.tracts.len() - self.valued_count()
    }
}

/// Look of the map; serializable so it can live in the config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapStyle {
    pub width: u32,
    pub height: u32,
    pub background: Rgb,
    pub missing_color: Rgb,
    pub outline_color: Rgb,
    pub outline_width: u32,
    pub title_font_size: u32,
}

impl Default for MapStyle {
    fn default() -> Self {
        MapStyle {
            width: 1500,
            height: 1000,
            background: Rgb::WHITE,
            missing_color: Rgb::LIGHT_GREY,
            outline_color: Rgb::BLACK,
            outline_width: 1,
            title_font_size: 28,
        }
    }
}

/// Inputs to `build_figure` besides the data
#[derive(Debug, Clone)]
pub struct FigureSpec {
    pub title: String,
    pub legend_label: String,
    pub style: MapStyle,
    pub mode: ColorMode,
}

impl FigureSpec {
    pub fn new(label: &str, metric_display_name: &str, year: u16, style: MapStyle) -> Self {
        FigureSpec {
            title: figure_title(label, metric_display_name, year),
            legend_label: metric_display_name.to_string(),
            style,
            mode: ColorMode::Continuous(ColorScale::viridis()),
        }
    }

    /// Same title, but colors come from `scheme` and the legend takes its title
    pub fn categorical(
        label: &str,
        metric_display_name: &str,
        year: u16,
        style: MapStyle,
        scheme: ColorScheme,
    ) -> Self {
        FigureSpec {
            title: figure_title(label, metric_display_name, year),
            legend_label: scheme.title.clone(),
            style,
            mode: ColorMode::Categorical(scheme),
        }
    }
}

pub fn figure_title(label: &str, metric_display_name: &str, year: u16) -> String {
    format!(
        "{} by Census Tract - {} ({})",
        metric_display_name, label, year
    )
}

const TITLE_BAND: f64 = 70.0;
const LEGEND_PANEL: f64 = 180.0;
const MARGIN: f64 = 20.0;
const LEGEND_TICKS: usize = 5;

/// Largest accepted canvas width or height, in pixels
pub const MAX_CANVAS_SIDE: u32 = 16_384;

/// Split joined rows into (has a finite value, missing)
pub fn partition(joined: &[JoinedRecord]) -> (Vec<&JoinedRecord>, Vec<&JoinedRecord>) {
    joined.iter().partition(|r| r.has_value())
}

/// Build the choropleth description. Pure: no drawing, no files.
pub fn build_figure(joined: &[JoinedRecord], spec: &FigureSpec) -> Figure {
    let style = &spec.style;
    let width = style.width as f64;
    let height = style.height as f64;

    let map_area = PixelRect {
        x: MARGIN,
        y: TITLE_BAND,
        width: (width - LEGEND_PANEL - 2.0 * MARGIN).max(1.0),
        height: (height - TITLE_BAND - MARGIN).max(1.0),
    };
    let legend_area = PixelRect {
        x: map_area.right() + MARGIN * 2.0,
        y: TITLE_BAND + 40.0,
        width: 24.0,
        height: (map_area.height * 0.6).max(1.0),
    };

    let range = match &spec.mode {
        ColorMode::Continuous(_) => {
            let (valued, _) = partition(joined);
            ValueRange::from_values(valued.iter().filter_map(|r| r.value))
        }
        ColorMode::Categorical(_) => None,
    };

    let bounds = joined
        .iter()
        .filter_map(|r| r.geometry.bounding_rect())
        .reduce(|a, b| {
            Rect::new(
                (a.min().x.min(b.min().x), a.min().y.min(b.min().y)),
                (a.max().x.max(b.max().x), a.max().y.max(b.max().y)),
            )
        });
    let projection = Projection::fit(bounds, map_area);

    let tracts: Vec<FigureTract> = joined
        .iter()
        .map(|r| {
            let (has_value, color) = match &spec.mode {
                ColorMode::Continuous(scale) => match (r.has_value(), r.value, range) {
                    (true, Some(v), Some(range)) => (true, scale.color_at(range.normalize(v))),
                    _ => (false, style.missing_color),
                },
                ColorMode::Categorical(scheme) => match scheme.class_for(r.category.as_deref()) {
                    Some(class) => (true, class.color),
                    None => (false, scheme.unknown_color),
                },
            };
            FigureTract {
                id: r.id.to_string(),
                value: r.value,
                has_value,
                color,
            }
        })
        .collect();

    // Larger outlines first so enclaves land on top of their hosts. Holes don't
    // count: a donut's net area can be smaller than the enclave inside it.
    let mut polygons: Vec<(usize, f64, &geo::Polygon<f64>)> = joined
        .iter()
        .enumerate()
        .flat_map(|(i, r)| r.geometry.iter().map(move |p| (i, exterior_area(p), p)))
        .collect();
    polygons.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let mut fills = Vec::new();
    let mut outlines = Vec::new();
    for (index, _, polygon) in &polygons {
        let tract = &tracts[*index];
        fills.push(FillLayer {
            tract: *index,
            ring: projection.project_ring(polygon.exterior()),
            color: tract.color,
            kind: if tract.has_value {
                FillKind::Value
            } else {
                FillKind::Missing
            },
        });
        for hole in polygon.interiors() {
            fills.push(FillLayer {
                tract: *index,
                ring: projection.project_ring(hole),
                color: style.background,
                kind: FillKind::Hole,
            });
        }

        outlines.push(projection.project_ring(polygon.exterior()));
        outlines.extend(polygon.interiors().iter().map(|h| projection.project_ring(h)));
    }

    let (colorbar, patches) = match &spec.mode {
        ColorMode::Continuous(scale) => {
            let ticks = range
                .map(|r| {
                    r.ticks(LEGEND_TICKS)
                        .into_iter()
                        .map(|v| (v, format!("{:.1}", v)))
                        .collect()
                })
                .unwrap_or_default();
            let colorbar = Colorbar {
                scale: scale.clone(),
                range,
                ticks,
            };
            let missing = LegendPatch {
                color: style.missing_color,
                label: "No data".to_string(),
            };
            (Some(colorbar), vec![missing])
        }
        ColorMode::Categorical(scheme) => (None, scheme.patches()),
    };

    tracing::debug!(
        valued = tracts.iter().filter(|t| t.has_value).count(),
        tracts = tracts.len(),
        fills = fills.len(),
        "figure built"
    );

    Figure {
        width: style.width,
        height: style.height,
        title: spec.title.clone(),
        title_font_size: style.title_font_size,
        background: style.background,
        map_area,
        tracts,
        fills,
        outlines,
        outline: Stroke {
            color: style.outline_color,
            width: style.outline_width,
        },
        legend: Legend {
            label: spec.legend_label.clone(),
            area: legend_area,
            colorbar,
            patches,
        },
    }
}

fn exterior_area(polygon: &geo::Polygon<f64>) -> f64 {
    geo::Polygon::new(polygon.exterior().clone(), vec![]).unsigned_area()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::join::merge;
    use crate::metrics::MetricRecord;
    use crate::tracts::{Tract, TractId};
    use geo::{polygon, MultiPolygon};

    fn square_tract(id: &str, x: f64) -> Tract {
        let square = polygon![
            (x: x, y: 30.0),
            (x: x + 0.1, y: 30.0),
            (x: x + 0.1, y: 30.1),
            (x: x, y: 30.1),
            (x: x, y: 30.0),
        ];
        let id = TractId::parse(id).unwrap();
        let county = id.county_code().to_string();
        Tract::new(id, county, MultiPolygon::new(vec![square]))
    }

    fn metric(id: &str, value: Option<f64>) -> MetricRecord {
        MetricRecord::new(TractId::parse(id).unwrap(), "Children in Poverty", value)
    }

    fn spec() -> FigureSpec {
        FigureSpec::new("Austin", "Children in Poverty", 2020, MapStyle::default())
    }

    #[test]
    fn test_abc_scenario_partitions() {
        // A has a value, B has no row, C has a row with NaN
        let tracts = vec![
            square_tract("48453000100", -97.8),
            square_tract("48453000200", -97.7),
            square_tract("48453000300", -97.6),
        ];
        let metrics = vec![
            metric("48453000100", Some(12.5)),
            metric("48453000300", Some(f64::NAN)),
        ];
        let joined = merge(&tracts, &metrics);

        let (valued, missing) = partition(&joined);
        assert_eq!(valued.len(), 1);
        assert_eq!(valued[0].id.as_str(), "48453000100");
        assert_eq!(missing.len(), 2);

        let figure = build_figure(&joined, &spec());
        let grey = MapStyle::default().missing_color;

        assert!(figure.tracts[0].has_value);
        assert_eq!(figure.tracts[0].value, Some(12.5));
        assert_ne!(figure.tracts[0].color, grey);
        // Single value sits in the middle of the scale
        assert_eq!(figure.tracts[0].color, ColorScale::viridis().color_at(0.5));

        assert!(!figure.tracts[1].has_value);
        assert_eq!(figure.tracts[1].color, grey);
        assert!(!figure.tracts[2].has_value);
        assert_eq!(figure.tracts[2].color, grey);

        assert_eq!(figure.valued_count(), 1);
        assert_eq!(figure.missing_count(), 2);
        assert_eq!(figure.outlines.len(), 3);
    }

    #[test]
    fn test_empty_metrics_builds_grey_map() {
        let tracts = vec![
            square_tract("48453000100", -97.8),
            square_tract("48453000200", -97.7),
        ];
        let joined = merge(&tracts, &[]);
        let figure = build_figure(&joined, &spec());

        let colorbar = figure.legend.colorbar.as_ref().unwrap();
        assert!(colorbar.range.is_none());
        assert!(colorbar.ticks.is_empty());
        assert_eq!(figure.legend.patches[0].label, "No data");
        assert!(figure.fills.iter().all(|f| f.kind == FillKind::Missing));
        assert!(figure.tracts.iter().all(|t| t.color == Rgb::LIGHT_GREY));
    }

    #[test]
    fn test_no_tracts_builds_empty_figure() {
        let figure = build_figure(&[], &spec());
        assert!(figure.fills.is_empty());
        assert!(figure.outlines.is_empty());
        assert_eq!(figure.title, "Children in Poverty by Census Tract - Austin (2020)");
    }

    #[test]
    fn test_projected_points_stay_in_map_area() {
        let tracts = vec![
            square_tract("48453000100", -97.8),
            square_tract("48453000200", -97.5),
        ];
        let joined = merge(&tracts, &[metric("48453000100", Some(1.0))]);
        let figure = build_figure(&joined, &spec());

        for ring in &figure.outlines {
            for point in ring {
                assert!(figure.map_area.contains(*point), "{:?} outside map", point);
            }
        }
    }

    #[test]
    fn test_value_range_and_colors() {
        let tracts = vec![
            square_tract("48453000100", -97.8),
            square_tract("48453000200", -97.7),
        ];
        let metrics = vec![metric("48453000100", Some(5.0)), metric("48453000200", Some(45.0))];
        let figure = build_figure(&merge(&tracts, &metrics), &spec());

        let range = figure.legend.range().unwrap();
        assert_eq!(range.min, 5.0);
        assert_eq!(range.max, 45.0);
        assert_eq!(figure.tracts[0].color, Rgb(68, 1, 84));
        assert_eq!(figure.tracts[1].color, Rgb(253, 231, 37));

        let colorbar = figure.legend.colorbar.as_ref().unwrap();
        let labels: Vec<&str> = colorbar.ticks.iter().map(|(_, l)| l.as_str()).collect();
        assert_eq!(labels, vec!["5.0", "15.0", "25.0", "35.0", "45.0"]);
    }

    #[test]
    fn test_holes_follow_their_polygon() {
        let with_hole = geo::Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)]),
            vec![LineString::from(vec![
                (0.4, 0.4),
                (0.6, 0.4),
                (0.6, 0.6),
                (0.4, 0.6),
                (0.4, 0.4),
            ])],
        );
        let enclave = geo::Polygon::new(
            LineString::from(vec![(0.45, 0.45), (0.55, 0.45), (0.55, 0.55), (0.45, 0.55), (0.45, 0.45)]),
            vec![],
        );
        let tracts = vec![
            Tract::new(
                TractId::parse("48453000200").unwrap(),
                "453".to_string(),
                MultiPolygon::new(vec![enclave]),
            ),
            Tract::new(
                TractId::parse("48453000100").unwrap(),
                "453".to_string(),
                MultiPolygon::new(vec![with_hole]),
            ),
        ];
        let figure = build_figure(&merge(&tracts, &[]), &spec());

        let kinds: Vec<(usize, FillKind)> = figure.fills.iter().map(|f| (f.tract, f.kind)).collect();
        assert_eq!(
            kinds,
            vec![(1, FillKind::Missing), (1, FillKind::Hole), (0, FillKind::Missing)]
        );
        assert_eq!(figure.fills[1].color, Rgb::WHITE);
        assert_eq!(figure.outlines.len(), 3);
    }

    #[test]
    fn test_enclave_filling_a_donut_hole_stays_on_top() {
        // The enclave covers most of the hole, so its area beats the donut's net area
        let donut = geo::Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)]),
            vec![LineString::from(vec![
                (0.1, 0.1),
                (0.9, 0.1),
                (0.9, 0.9),
                (0.1, 0.9),
                (0.1, 0.1),
            ])],
        );
        let enclave = geo::Polygon::new(
            LineString::from(vec![(0.1, 0.1), (0.9, 0.1), (0.9, 0.9), (0.1, 0.9), (0.1, 0.1)]),
            vec![],
        );
        assert!(enclave.unsigned_area() > donut.unsigned_area());

        let tracts = vec![
            Tract::new(
                TractId::parse("48453000100").unwrap(),
                "453".to_string(),
                MultiPolygon::new(vec![donut]),
            ),
            Tract::new(
                TractId::parse("48453000200").unwrap(),
                "453".to_string(),
                MultiPolygon::new(vec![enclave]),
            ),
        ];
        let figure = build_figure(&merge(&tracts, &[]), &spec());

        let kinds: Vec<(usize, FillKind)> = figure.fills.iter().map(|f| (f.tract, f.kind)).collect();
        assert_eq!(
            kinds,
            vec![(0, FillKind::Missing), (0, FillKind::Hole), (1, FillKind::Missing)]
        );
    }

    fn category_metric(id: &str, category: &str) -> MetricRecord {
        MetricRecord::categorical(TractId::parse(id).unwrap(), "COMP_RANK", category)
    }

    #[test]
    fn test_categorical_figure_uses_scheme_colors() {
        let tracts = vec![
            square_tract("26163500100", -83.2),
            square_tract("26163500200", -83.1),
            square_tract("26163500300", -83.0),
            square_tract("26163500400", -82.9),
        ];
        let metrics = vec![
            category_metric("26163500100", "1"),
            category_metric("26163500200", "3.0"),
            category_metric("26163500300", "7"),
        ];
        let spec = FigureSpec::categorical(
            "Detroit",
            "Opportunity Rankings",
            2020,
            MapStyle::default(),
            ColorScheme::opportunity_rankings(),
        );
        let figure = build_figure(&merge(&tracts, &metrics), &spec);

        assert_eq!(figure.title, "Opportunity Rankings by Census Tract - Detroit (2020)");
        assert_eq!(figure.tracts[0].color, Rgb(46, 204, 113));
        assert_eq!(figure.tracts[1].color, Rgb(231, 76, 60));
        // Unlisted rank and missing row both fall back to white
        assert_eq!(figure.tracts[2].color, Rgb::WHITE);
        assert_eq!(figure.tracts[3].color, Rgb::WHITE);
        assert_eq!(figure.valued_count(), 2);

        assert!(figure.legend.colorbar.is_none());
        assert_eq!(figure.legend.label, "Opportunity Rankings");
        let labels: Vec<&str> = figure.legend.patches.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["High Opportunity Area", "Medium Opportunity Area", "Low Opportunity Area"]
        );
    }

    #[test]
    fn test_dominant_race_scheme_lists_unknown() {
        let scheme = ColorScheme::dominant_race();
        assert!(scheme.validate().is_ok());
        assert_eq!(scheme.class_for(Some("hispanic")).unwrap().color, Rgb(221, 160, 221));
        assert!(scheme.class_for(Some("Hispanic")).is_none());
        assert!(scheme.class_for(None).is_none());

        let patches = scheme.patches();
        assert_eq!(patches.len(), 8);
        assert_eq!(
            patches.last(),
            Some(&LegendPatch {
                color: Rgb::WHITE,
                label: "Unknown".to_string()
            })
        );
    }

    #[test]
    fn test_scheme_rejects_repeated_category() {
        let mut scheme = ColorScheme::opportunity_rankings();
        scheme.classes.push(CategoryClass::new("1.0", "Again", Rgb::BLACK));
        assert!(scheme.validate().is_err());

        scheme.classes.clear();
        assert!(scheme.validate().is_err());
    }

    #[test]
    fn test_color_scale_clamps() {
        let scale = ColorScale::viridis();
        assert_eq!(scale.color_at(-1.0), Rgb(68, 1, 84));
        assert_eq!(scale.color_at(2.0), Rgb(253, 231, 37));
        assert_eq!(scale.color_at(f64::NAN), Rgb(68, 1, 84));
    }

    #[test]
    fn test_value_range_ignores_non_finite() {
        assert!(ValueRange::from_values(vec![f64::NAN, f64::INFINITY]).is_none());

        let range = ValueRange::from_values(vec![3.0, f64::NAN, 1.0]).unwrap();
        assert_eq!((range.min, range.max), (1.0, 3.0));
        assert_eq!(range.normalize(2.0), 0.5);

        let flat = ValueRange { min: 4.0, max: 4.0 };
        assert_eq!(flat.normalize(4.0), 0.5);
        assert_eq!(flat.ticks(5), vec![4.0]);
    }

    #[test]
    fn test_rgb_hex_round_trip() {
        let color = Rgb::from_hex("#d3d3d3").unwrap();
        assert_eq!(color, Rgb::LIGHT_GREY);
        assert_eq!(color.to_string(), "#d3d3d3");
        assert!(Rgb::from_hex("grey").is_err());
        assert!(Rgb::from_hex("#12345").is_err());
    }
}
