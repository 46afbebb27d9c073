//! Row-major f64 grid with NaN as the in-memory no-data marker.
//!
//! Terrain and soil layers arrive as ESRI ASCII grids; annual summaries are
//! built as rasters before being scaled into persisted artifacts. Georeference
//! fields are carried only far enough to verify co-registration and to write
//! headers back out.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{EngineError, EngineResult};

/// No-data value written to ASCII grid output.
pub const ASCII_NODATA: f64 = -9999.0;

#[derive(Debug, Clone)]
pub struct Raster {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
    /// ASCII grid georeference, kept for co-registration checks and output.
    pub xllcorner: f64,
    pub yllcorner: f64,
    pub cellsize: f64,
}

impl Raster {
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> EngineResult<Self> {
        if data.len() != rows * cols {
            return Err(EngineError::SizeMismatch {
                name: "raster data",
                expected: rows * cols,
                actual: data.len(),
            });
        }
        Ok(Self {
            rows,
            cols,
            data,
            xllcorner: 0.0,
            yllcorner: 0.0,
            cellsize: 1.0,
        })
    }

    /// Raster with every cell set to `value`.
    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
            xllcorner: 0.0,
            yllcorner: 0.0,
            cellsize: 1.0,
        }
    }

    /// Raster with every cell no-data.
    pub fn nodata(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, f64::NAN)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn same_shape(&self, other: &Raster) -> bool {
        self.rows == other.rows && self.cols == other.cols
    }

    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[self.index(row, col)]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        let i = self.index(row, col);
        self.data[i] = value;
    }

    #[inline]
    pub fn at(&self, index: usize) -> f64 {
        self.data[index]
    }

    #[inline]
    pub fn set_at(&mut self, index: usize, value: f64) {
        self.data[index] = value;
    }

    pub fn values(&self) -> &[f64] {
        &self.data
    }

    /// No-data test for a cell value.
    #[inline]
    pub fn is_nodata(value: f64) -> bool {
        !value.is_finite()
    }

    /// Read an ESRI ASCII grid (`ncols`/`nrows`/... header, then rows of
    /// whitespace-separated values). Header keys are case-insensitive;
    /// `NODATA_value` cells become NaN.
    pub fn from_ascii_grid_path(path: &Path) -> EngineResult<Self> {
        if !path.exists() {
            return Err(EngineError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let text = fs::read_to_string(path).map_err(|e| EngineError::io(path, e))?;

        let mut ncols: Option<usize> = None;
        let mut nrows: Option<usize> = None;
        let mut xllcorner = 0.0;
        let mut yllcorner = 0.0;
        let mut cellsize = 1.0;
        let mut nodata = ASCII_NODATA;
        let mut data: Vec<f64> = Vec::new();

        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut parts = line.split_whitespace();
            let Some(first) = parts.next() else {
                continue;
            };
            if first.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
                let value = parts.next().ok_or_else(|| {
                    EngineError::parse(path, lineno + 1, format!("header {first} has no value"))
                })?;
                let key = first.to_ascii_lowercase();
                match key.as_str() {
                    "ncols" | "nrows" => {
                        let n: usize = value.parse().map_err(|_| {
                            EngineError::parse(path, lineno + 1, format!("bad {key}: {value}"))
                        })?;
                        if key == "ncols" {
                            ncols = Some(n);
                        } else {
                            nrows = Some(n);
                        }
                    }
                    "xllcorner" | "yllcorner" | "cellsize" | "nodata_value" => {
                        let v: f64 = value.parse().map_err(|_| {
                            EngineError::parse(path, lineno + 1, format!("bad {key}: {value}"))
                        })?;
                        match key.as_str() {
                            "xllcorner" => xllcorner = v,
                            "yllcorner" => yllcorner = v,
                            "cellsize" => cellsize = v,
                            _ => nodata = v,
                        }
                    }
                    _ => {
                        return Err(EngineError::parse(
                            path,
                            lineno + 1,
                            format!("unknown header key {first}"),
                        ));
                    }
                }
            } else {
                for token in line.split_whitespace() {
                    let v: f64 = token.parse().map_err(|_| {
                        EngineError::parse(path, lineno + 1, format!("bad cell value {token}"))
                    })?;
                    data.push(if v == nodata { f64::NAN } else { v });
                }
            }
        }

        let (rows, cols) = match (nrows, ncols) {
            (Some(r), Some(c)) => (r, c),
            _ => {
                return Err(EngineError::parse(
                    path,
                    1,
                    "missing ncols/nrows header".to_string(),
                ));
            }
        };
        let mut raster = Self::new(rows, cols, data)?;
        raster.xllcorner = xllcorner;
        raster.yllcorner = yllcorner;
        raster.cellsize = cellsize;
        Ok(raster)
    }

    /// Write the raster as an ESRI ASCII grid. NaN cells become the
    /// `NODATA_value`.
    pub fn to_ascii_grid_path(&self, path: &Path) -> EngineResult<()> {
        let file = fs::File::create(path).map_err(|e| EngineError::io(path, e))?;
        let mut w = BufWriter::new(file);
        let write = |w: &mut BufWriter<fs::File>, s: String| -> EngineResult<()> {
            w.write_all(s.as_bytes()).map_err(|e| EngineError::io(path, e))
        };
        write(&mut w, format!("ncols {}\n", self.cols))?;
        write(&mut w, format!("nrows {}\n", self.rows))?;
        write(&mut w, format!("xllcorner {}\n", self.xllcorner))?;
        write(&mut w, format!("yllcorner {}\n", self.yllcorner))?;
        write(&mut w, format!("cellsize {}\n", self.cellsize))?;
        write(&mut w, format!("NODATA_value {ASCII_NODATA}\n"))?;
        for row in 0..self.rows {
            let mut line = String::new();
            for col in 0..self.cols {
                if col > 0 {
                    line.push(' ');
                }
                let v = self.get(row, col);
                if Self::is_nodata(v) {
                    line.push_str(&format!("{ASCII_NODATA}"));
                } else {
                    line.push_str(&format!("{v}"));
                }
            }
            line.push('\n');
            write(&mut w, line)?;
        }
        w.flush().map_err(|e| EngineError::io(path, e))
    }
}
