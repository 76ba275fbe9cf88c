use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{ClearskyError, Result};
use crate::io::naming::{NamingMetadata, NamingTemplate};
use crate::io::raster::{write_geotiff, RasterMetadata};
use crate::scene::BucketKey;
use crate::stack::Composite;

/// Persists one composite as a single-band georeferenced raster.
pub trait RasterWriter: Send + Sync {
    /// Extension of the output file, without the dot.
    fn extension(&self) -> &str;

    fn write(&self, composite: &Composite, path: &Path) -> Result<()>;
}

/// Float32 GeoTIFF output with geotransform, CRS and the fill value as no-data.
#[derive(Clone, Copy, Debug, Default)]
pub struct GeoTiffWriter;

impl RasterWriter for GeoTiffWriter {
    fn extension(&self) -> &str {
        "tif"
    }

    fn write(&self, composite: &Composite, path: &Path) -> Result<()> {
        let meta = RasterMetadata {
            description: format!("clearsky median composite {}", composite.bucket),
            band_name: composite.band.clone(),
            acquisition_dates: composite
                .scenes
                .iter()
                .map(|s| s.timestamp.format("%Y-%m-%d").to_string())
                .collect(),
        };
        write_geotiff(&composite.grid, path, &meta)
    }
}

/// A composite that could not be written.
#[derive(Debug)]
pub struct WriteFailure {
    pub bucket: BucketKey,
    pub band: String,
    pub error: ClearskyError,
}

#[derive(Debug, Default)]
pub struct WriteReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<WriteFailure>,
}

/// Output path of `composite` under `dir`.
pub fn output_path(
    writer: &dyn RasterWriter,
    composite: &Composite,
    template: &NamingTemplate,
    meta: &NamingMetadata,
    dir: &Path,
) -> PathBuf {
    let stem = template.render(composite, meta);
    dir.join(format!("{stem}.{}", writer.extension()))
}

/// Write one composite under `dir`, named from `template`.
pub fn write_composite(
    writer: &dyn RasterWriter,
    composite: &Composite,
    template: &NamingTemplate,
    meta: &NamingMetadata,
    dir: &Path,
) -> Result<PathBuf> {
    let path = output_path(writer, composite, template, meta, dir);
    write_to(writer, composite, path)
}

fn write_to(writer: &dyn RasterWriter, composite: &Composite, path: PathBuf) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    writer.write(composite, &path)?;
    info!(bucket = %composite.bucket, band = %composite.band, path = %path.display(), "Wrote composite");
    Ok(path)
}

/// Write every composite; a failure is recorded and the rest still get written.
///
/// A composite whose name collides with one already written in this call
/// fails instead of overwriting it.
pub fn write_composites(
    writer: &dyn RasterWriter,
    composites: &[Composite],
    template: &NamingTemplate,
    meta: &NamingMetadata,
    dir: &Path,
) -> WriteReport {
    let mut report = WriteReport::default();
    let mut claimed: HashSet<PathBuf> = HashSet::new();
    for composite in composites {
        let path = output_path(writer, composite, template, meta, dir);
        let result = if claimed.insert(path.clone()) {
            write_to(writer, composite, path)
        } else {
            Err(ClearskyError::DuplicateOutput { path })
        };
        match result {
            Ok(path) => report.written.push(path),
            Err(error) => {
                warn!(bucket = %composite.bucket, band = %composite.band, error = %error, "Write failed");
                report.failed.push(WriteFailure {
                    bucket: composite.bucket,
                    band: composite.band.clone(),
                    error,
                });
            }
        }
    }
    report
}
