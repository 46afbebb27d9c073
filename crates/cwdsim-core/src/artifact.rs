//! Persisted raster artifacts.
//!
//! One artifact per (site, climate-source, variable), uniquely named so
//! parallel runs never contend for a path. In memory the engine works in f64
//! millimetres; persisted values follow the downstream consumers' convention:
//! mm scaled by 10 and truncated to i32, no-data as `i32::MIN`.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::raster::Raster;

/// Storage scale: persisted integers are mm * 10.
pub const SCALE: f64 = 10.0;

/// No-data marker in scaled storage.
pub const SCALED_NODATA: i32 = i32::MIN;

/// Scale a value in mm into storage form: mm * 10, truncated toward zero.
#[inline]
pub fn encode_scaled(mm: f64) -> i32 {
    if Raster::is_nodata(mm) {
        SCALED_NODATA
    } else {
        (mm * SCALE) as i32
    }
}

/// Recover mm from storage form.
#[inline]
pub fn decode_scaled(stored: i32) -> f64 {
    if stored == SCALED_NODATA {
        f64::NAN
    } else {
        stored as f64 / SCALE
    }
}

/// Output variable of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variable {
    Aet,
    Cwd,
}

impl Variable {
    pub const ALL: [Variable; 2] = [Variable::Aet, Variable::Cwd];

    pub fn label(self) -> &'static str {
        match self {
            Variable::Aet => "aet",
            Variable::Cwd => "cwd",
        }
    }
}

/// Unique artifact file name for a (site, climate-source, variable) tuple.
///
/// Labels are sanitized so the name is filesystem-safe; the double
/// underscore keeps fields unambiguous when a label itself contains one.
pub fn artifact_file_name(site: &str, source_label: &str, variable: Variable) -> String {
    format!(
        "{}__{}__{}.wb.gz",
        sanitize(site),
        sanitize(source_label),
        variable.label()
    )
}

fn sanitize(label: &str) -> String {
    label
        .to_ascii_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// A stack of scaled annual rasters for one variable of one run.
#[derive(Debug, Serialize, Deserialize)]
pub struct RasterArtifact {
    pub site: String,
    pub source_label: String,
    pub variable: Variable,
    /// One entry per raster in `values`. A multi-year summary artifact
    /// carries the window's years and a single raster.
    pub years: Vec<i32>,
    pub rows: usize,
    pub cols: usize,
    /// Scaled values, row-major, one Vec per raster.
    pub values: Vec<Vec<i32>>,
}

impl RasterArtifact {
    pub fn from_rasters(
        site: &str,
        source_label: &str,
        variable: Variable,
        years: Vec<i32>,
        rasters: &[Raster],
    ) -> EngineResult<Self> {
        if rasters.is_empty() {
            return Err(EngineError::input("artifact with no rasters"));
        }
        let rows = rasters[0].rows();
        let cols = rasters[0].cols();
        for r in rasters {
            if r.rows() != rows || r.cols() != cols {
                return Err(EngineError::SizeMismatch {
                    name: "artifact raster",
                    expected: rows * cols,
                    actual: r.len(),
                });
            }
        }
        let values = rasters
            .iter()
            .map(|r| r.values().iter().copied().map(encode_scaled).collect())
            .collect();
        Ok(Self {
            site: site.to_string(),
            source_label: source_label.to_string(),
            variable,
            years,
            rows,
            cols,
            values,
        })
    }

    /// Decode one raster back to mm.
    pub fn to_raster(&self, index: usize) -> EngineResult<Raster> {
        let stored = self.values.get(index).ok_or_else(|| {
            EngineError::input(format!(
                "artifact has {} rasters, asked for index {index}",
                self.values.len()
            ))
        })?;
        Raster::new(
            self.rows,
            self.cols,
            stored.iter().copied().map(decode_scaled).collect(),
        )
    }

    pub fn file_name(&self) -> String {
        artifact_file_name(&self.site, &self.source_label, self.variable)
    }

    /// Write gzip-compressed bincode.
    pub fn write_path(&self, path: &Path) -> EngineResult<()> {
        let file = File::create(path).map_err(|e| EngineError::io(path, e))?;
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        bincode::serialize_into(&mut encoder, self)?;
        let mut writer = encoder.finish().map_err(|e| EngineError::io(path, e))?;
        writer.flush().map_err(|e| EngineError::io(path, e))?;
        Ok(())
    }

    pub fn read_path(path: &Path) -> EngineResult<Self> {
        if !path.exists() {
            return Err(EngineError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let file = File::open(path).map_err(|e| EngineError::io(path, e))?;
        let decoder = GzDecoder::new(BufReader::new(file));
        let artifact = bincode::deserialize_from(decoder)?;
        Ok(artifact)
    }

    /// Full output path under a directory.
    pub fn path_under(&self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }
}
