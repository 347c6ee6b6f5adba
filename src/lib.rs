// Tract Choropleth - Core Library
// Census tract boundaries + per-tract metrics → choropleth PNG

pub mod error;
pub mod tracts;     // Tract Loader - boundary providers + GEOID normalization
pub mod metrics;    // Metric Reader - CSV filtering by metric name
pub mod join;       // Joiner - left join on GEOID
pub mod figure;     // Figure Builder - pure choropleth description
pub mod render;     // Renderer - plotters raster + PNG output
pub mod config;
pub mod pipeline;

// Only compile the terminal preview when the TUI feature is enabled
#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use error::{MapError, Result};
pub use tracts::{
    Tract, TractId, BoundaryProvider, FeatureFields, FeaturePage,
    TigerWebProvider, GeoJsonFileProvider,
    get_tracts, filter_county, normalize_fips, parse_feature_collection, parse_feature_page,
};
pub use metrics::{
    MetricRecord, MetricLayout, MetricReader,
    get_metric,
};
pub use join::{
    JoinedRecord, JoinReport, DuplicatePolicy,
    merge, merge_with, write_unmatched,
};
pub use figure::{
    Figure, FigureSpec, MapStyle, ColorScale, ColorScheme, CategoryClass, ColorMode, ValueRange, Rgb,
    build_figure, partition,
};
pub use render::{
    Raster,
    rasterize, render_png, output_path,
};
pub use config::{MapConfig, MapJob, MetricSettings, ProviderSettings};
pub use pipeline::{PreparedMap, prepare_job, persist, provider_from_config};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
