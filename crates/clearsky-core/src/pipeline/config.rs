use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_CHUNK_ROWS, DEFAULT_CLASSIFICATION_NODATA, DEFAULT_EXCLUDED_CLASSES,
    DEFAULT_FILL_VALUE, DEFAULT_MAX_COMBINATIONS, DEFAULT_MIN_FRACTION_VALID,
    DEFAULT_NAMING_TEMPLATE, DEFAULT_REPRESENTATIVE_NAMING_TEMPLATE,
};
use crate::error::{ClearskyError, Result};
use crate::grid::Bounds;
use crate::io::naming::NamingTemplate;
use crate::mask::ExcludedClasses;
use crate::scene::BucketGranularity;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Scene catalog (JSON).
    pub catalog: PathBuf,
    /// Directory receiving one raster per bucket and band.
    pub output_dir: PathBuf,
    /// Catalog-level cloud cover pre-filter, percent.
    #[serde(default)]
    pub max_cloud_cover_scene: Option<f64>,
    /// Inclusive acquisition window applied to the catalog.
    #[serde(default)]
    pub date_range: Option<DateRange>,
    /// Target extent in the scenes' CRS; scenes are cropped to it.
    #[serde(default)]
    pub extent: Option<Bounds>,
    #[serde(default)]
    pub masking: MaskingConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub compositing: CompositingConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
}

impl PipelineConfig {
    pub fn new(catalog: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            catalog,
            output_dir,
            max_cloud_cover_scene: None,
            date_range: None,
            extent: None,
            masking: MaskingConfig::default(),
            selection: SelectionConfig::default(),
            compositing: CompositingConfig::default(),
            output: OutputConfig::default(),
            execution: ExecutionConfig::default(),
        }
    }

    /// Reject values that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<()> {
        let fraction = self.selection.min_fraction_valid;
        if !(0.0..=1.0).contains(&fraction) {
            return Err(ClearskyError::InvalidConfig(format!(
                "min_fraction_valid {fraction} outside [0, 1]"
            )));
        }
        if let Some(&month) = self
            .selection
            .allowed_months
            .iter()
            .find(|m| !(1..=12).contains(*m))
        {
            return Err(ClearskyError::InvalidConfig(format!(
                "allowed month {month} outside 1..=12"
            )));
        }
        if let Some(range) = &self.date_range {
            if range.start > range.end {
                return Err(ClearskyError::InvalidConfig(format!(
                    "date range starts {} after it ends {}",
                    range.start, range.end
                )));
            }
        }
        if let Some(extent) = &self.extent {
            if !extent.is_valid() {
                return Err(ClearskyError::InvalidConfig(format!(
                    "degenerate extent {extent:?}"
                )));
            }
        }
        if self.compositing.bands.is_empty() {
            return Err(ClearskyError::InvalidConfig("no bands to composite".into()));
        }
        if self.compositing.chunk_rows == 0 {
            return Err(ClearskyError::InvalidConfig("chunk_rows must be > 0".into()));
        }
        if self.selection.search.max_combinations == Some(0) {
            return Err(ClearskyError::InvalidConfig(
                "max_combinations must be > 0".into(),
            ));
        }
        self.naming_template()?;
        Ok(())
    }

    /// Template text in effect: the configured one, else the policy default.
    pub fn naming_template_text(&self) -> &str {
        match (&self.output.naming_template, self.selection.policy) {
            (Some(text), _) => text,
            (None, SelectionPolicy::RetainAll) => DEFAULT_NAMING_TEMPLATE,
            (None, SelectionPolicy::RepresentativeSingleDate) => {
                DEFAULT_REPRESENTATIVE_NAMING_TEMPLATE
            }
        }
    }

    /// Parsed output template, checked against the configured band count.
    pub fn naming_template(&self) -> Result<NamingTemplate> {
        let template = NamingTemplate::parse(self.naming_template_text())?;
        template.check_band_count(self.compositing.bands.len())?;
        Ok(template)
    }
}

/// Inclusive time window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn contains(&self, t: &DateTime<Utc>) -> bool {
        *t >= self.start && *t <= self.end
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskingConfig {
    /// Classification codes treated as cloud, shadow or otherwise unusable.
    pub excluded_classes: Vec<u8>,
    /// Classification code marking no-data, unless the asset overrides it.
    pub classification_nodata: u8,
    /// Mask value bands with each scene's validity grid before compositing.
    pub mask_bands: bool,
}

impl MaskingConfig {
    pub fn excluded(&self) -> ExcludedClasses {
        ExcludedClasses::new(&self.excluded_classes)
    }
}

impl Default for MaskingConfig {
    fn default() -> Self {
        Self {
            excluded_classes: DEFAULT_EXCLUDED_CLASSES.to_vec(),
            classification_nodata: DEFAULT_CLASSIFICATION_NODATA,
            mask_bands: true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub policy: SelectionPolicy,
    /// Scenes need strictly more valid pixels than this fraction.
    pub min_fraction_valid: f64,
    pub granularity: BucketGranularity,
    /// Months (1-12) eligible for representative-date selection. Empty = all.
    pub allowed_months: Vec<u32>,
    pub search: SearchConfig,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            policy: SelectionPolicy::default(),
            min_fraction_valid: DEFAULT_MIN_FRACTION_VALID,
            granularity: BucketGranularity::default(),
            allowed_months: Vec::new(),
            search: SearchConfig::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionPolicy {
    /// Keep every scene above the coverage threshold.
    #[default]
    RetainAll,
    /// Exactly one scene per bucket, aligned by day of year across buckets.
    RepresentativeSingleDate,
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RetainAll => write!(f, "Retain All"),
            Self::RepresentativeSingleDate => write!(f, "Representative Single Date"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub strategy: SearchStrategy,
    /// Refuse exhaustive searches larger than this. `None` = no cap.
    pub max_combinations: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            strategy: SearchStrategy::default(),
            max_combinations: Some(DEFAULT_MAX_COMBINATIONS),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchStrategy {
    /// Enumerate every combination. Optimal.
    #[default]
    Exhaustive,
    /// Anchor-and-extend heuristic. Fast, not guaranteed optimal.
    Greedy,
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhaustive => write!(f, "Exhaustive"),
            Self::Greedy => write!(f, "Greedy"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositingConfig {
    /// Value bands to composite; one output per band per bucket.
    pub bands: Vec<String>,
    pub fill_value: f32,
    pub chunk_rows: usize,
}

impl Default for CompositingConfig {
    fn default() -> Self {
        Self {
            bands: vec!["B04".into()],
            fill_value: DEFAULT_FILL_VALUE,
            chunk_rows: DEFAULT_CHUNK_ROWS,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Placeholders: `{tile}`, `{orbit}`, `{bucket}`, `{date}`, `{band}`.
    /// Unset uses the selection policy's default.
    pub naming_template: Option<String>,
    /// Overrides the catalog's tile identifier.
    pub tile: Option<String>,
    /// Overrides the catalog's orbit identifier.
    pub orbit: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Worker threads; `None` = one per core.
    #[serde(default)]
    pub threads: Option<usize>,
    /// Fail the run when any catalog scene cannot be loaded.
    #[serde(default)]
    pub require_all_scenes: bool,
}
