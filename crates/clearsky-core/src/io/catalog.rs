use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use gdal::raster::GdalType;
use num_traits::NumCast;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::compute::WorkerPool;
use crate::consts::DEFAULT_CLASSIFICATION_NODATA;
use crate::error::{ClearskyError, Result};
use crate::grid::{Bounds, Grid, Sample};
use crate::io::raster::{read_raster, FallbackPlacement};
use crate::pipeline::config::DateRange;
use crate::scene::Scene;

/// Reference to a raster file, optionally overriding its no-data value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssetRef {
    Path(PathBuf),
    Detailed {
        href: PathBuf,
        #[serde(default)]
        nodata: Option<f64>,
    },
}

impl AssetRef {
    pub fn href(&self) -> &Path {
        match self {
            Self::Path(p) => p,
            Self::Detailed { href, .. } => href,
        }
    }

    pub fn nodata(&self) -> Option<f64> {
        match self {
            Self::Path(_) => None,
            Self::Detailed { nodata, .. } => *nodata,
        }
    }
}

/// One catalog entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneDescriptor {
    pub id: String,
    pub datetime: DateTime<Utc>,
    /// Scene-level cloud cover estimate, percent.
    #[serde(default, alias = "eo:cloud_cover")]
    pub cloud_cover: Option<f64>,
    pub classification: AssetRef,
    pub bands: BTreeMap<String, AssetRef>,
    /// `[min_x, min_y, max_x, max_y]` in `crs`.
    pub bbox: [f64; 4],
    pub crs: String,
}

/// On-disk catalog layout.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub tile: Option<String>,
    #[serde(default)]
    pub orbit: Option<String>,
    pub scenes: Vec<SceneDescriptor>,
}

/// How scenes are materialised from their assets.
#[derive(Clone, Debug)]
pub struct LoadOptions {
    /// Bands to read; empty reads every band.
    pub bands: Vec<String>,
    /// Read only the classification grid, e.g. for coverage scoring.
    pub classification_only: bool,
    /// Crop every grid to this extent.
    pub extent: Option<Bounds>,
    /// Classification no-data code unless the asset sets one.
    pub classification_nodata: u8,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            bands: Vec::new(),
            classification_only: false,
            extent: None,
            classification_nodata: DEFAULT_CLASSIFICATION_NODATA,
        }
    }
}

/// Scenes loaded from a catalog, plus the ones that failed.
#[derive(Debug, Default)]
pub struct LoadedScenes {
    pub scenes: Vec<Scene>,
    pub failures: Vec<(String, ClearskyError)>,
}

/// Local scene catalog. Asset paths resolve relative to the catalog file.
#[derive(Clone, Debug)]
pub struct SceneCatalog {
    pub root: PathBuf,
    pub tile: Option<String>,
    pub orbit: Option<String>,
    /// Sorted by `(datetime, id)`.
    pub scenes: Vec<SceneDescriptor>,
}

impl SceneCatalog {
    pub fn open(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::from_json_str(&text, root)
    }

    pub fn from_json_str(text: &str, root: PathBuf) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(text)?;
        Self::from_file(file, root)
    }

    pub fn from_file(file: CatalogFile, root: PathBuf) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for desc in &file.scenes {
            if !seen.insert(desc.id.as_str()) {
                return Err(ClearskyError::InvalidCatalog(format!(
                    "duplicate scene id '{}'",
                    desc.id
                )));
            }
            if !Bounds::from_array(desc.bbox).is_valid() {
                return Err(ClearskyError::InvalidCatalog(format!(
                    "scene '{}' has degenerate bbox {:?}",
                    desc.id, desc.bbox
                )));
            }
        }

        let mut scenes = file.scenes;
        scenes.sort_by(|a, b| a.datetime.cmp(&b.datetime).then_with(|| a.id.cmp(&b.id)));
        Ok(Self {
            root,
            tile: file.tile,
            orbit: file.orbit,
            scenes,
        })
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Catalog-level pre-filters: acquisition window and scene cloud cover.
    /// Scenes without a cloud cover estimate pass the cloud filter.
    pub fn filter(
        &self,
        date_range: Option<&DateRange>,
        max_cloud_cover: Option<f64>,
    ) -> Vec<&SceneDescriptor> {
        self.scenes
            .iter()
            .filter(|d| date_range.is_none_or(|r| r.contains(&d.datetime)))
            .filter(|d| match (max_cloud_cover, d.cloud_cover) {
                (Some(max), Some(cc)) => cc <= max,
                _ => true,
            })
            .collect()
    }

    pub fn resolve(&self, asset: &AssetRef) -> PathBuf {
        let href = asset.href();
        if href.is_absolute() {
            href.to_path_buf()
        } else {
            self.root.join(href)
        }
    }

    /// Read a scene's classification and bands from disk.
    pub fn load_scene(&self, desc: &SceneDescriptor, options: &LoadOptions) -> Result<Scene> {
        let bbox = Bounds::from_array(desc.bbox);

        let class_nodata = desc
            .classification
            .nodata()
            .map(|v| {
                u8::try_from(v as i64).map_err(|_| {
                    ClearskyError::InvalidCatalog(format!(
                        "scene '{}' classification nodata {v} is not a class code",
                        desc.id
                    ))
                })
            })
            .transpose()?;
        let mut classification: Grid<u8> =
            self.load_asset(&desc.classification, &bbox, &desc.crs)?;
        classification.nodata = Some(
            class_nodata
                .or(classification.nodata)
                .unwrap_or(options.classification_nodata),
        );

        let mut bands = BTreeMap::new();
        for (name, asset) in &desc.bands {
            if options.classification_only
                || (!options.bands.is_empty() && !options.bands.contains(name))
            {
                continue;
            }
            let mut grid: Grid<f32> = self.load_asset(asset, &bbox, &desc.crs)?;
            if let Some(v) = asset.nodata() {
                grid.nodata = Some(v as f32);
            }
            bands.insert(name.clone(), grid);
        }
        for wanted in &options.bands {
            if !options.classification_only && !bands.contains_key(wanted) {
                return Err(ClearskyError::MissingBand {
                    scene_id: desc.id.clone(),
                    band: wanted.clone(),
                });
            }
        }

        let mut scene = Scene {
            id: desc.id.clone(),
            timestamp: desc.datetime,
            classification,
            bands,
        };
        if let Some(extent) = &options.extent {
            scene = crop_scene(scene, extent)?;
        }
        debug!(
            scene = %scene.id,
            rows = scene.classification.rows(),
            cols = scene.classification.cols(),
            bands = scene.bands.len(),
            "Loaded scene"
        );
        Ok(scene)
    }

    /// Read an asset, placing it on the scene bbox when it has no
    /// georeferencing of its own.
    fn load_asset<T: Sample + NumCast + GdalType>(
        &self,
        asset: &AssetRef,
        bbox: &Bounds,
        crs: &str,
    ) -> Result<Grid<T>> {
        let path = self.resolve(asset);
        read_raster(&path, Some(FallbackPlacement { bounds: bbox, crs }))
    }

    /// Load many scenes on the worker pool. A scene that fails is logged and
    /// reported; the others are unaffected. Output keeps catalog order.
    pub fn load_scenes(
        &self,
        descriptors: &[&SceneDescriptor],
        options: &LoadOptions,
        pool: &WorkerPool,
    ) -> LoadedScenes {
        let results: Vec<(String, Result<Scene>)> = pool.install(|| {
            descriptors
                .par_iter()
                .map(|d| (d.id.clone(), self.load_scene(d, options)))
                .collect()
        });

        let mut loaded = LoadedScenes::default();
        for (id, result) in results {
            match result {
                Ok(scene) => loaded.scenes.push(scene),
                Err(e) => {
                    warn!(scene = %id, error = %e, "Scene failed to load");
                    loaded.failures.push((id, e));
                }
            }
        }
        loaded
    }
}

fn crop_scene(scene: Scene, extent: &Bounds) -> Result<Scene> {
    let classification = scene.classification.crop_to_bounds(extent)?;
    let bands = scene
        .bands
        .iter()
        .map(|(name, grid)| Ok((name.clone(), grid.crop_to_bounds(extent)?)))
        .collect::<Result<BTreeMap<_, _>>>()?;
    Ok(Scene {
        classification,
        bands,
        ..scene
    })
}
