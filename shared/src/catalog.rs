//! Source catalogs for measured detections and reference truth
//!
//! A catalog is an in-memory list of point sources. Both sides of a
//! verification (pipeline output and the reference catalog) use the same
//! type so the matching and statistics code never cares where a table came
//! from.
//!
//! Two on-disk formats are read:
//! - JSON: `{"name": ..., "epoch": ..., "sources": [{"id", "ra", "dec", ...}]}`
//! - CSV: header row with at least `id,ra,dec`, optionally
//!   `mag,mag_err,pm_ra,pm_dec`; other columns are ignored. Quoting
//!   follows RFC 4180, lines starting with `#` are skipped and a leading
//!   byte order mark is dropped.
//!
//! RA and Dec are always in degrees on disk; proper motions in mas/yr.

use crate::range_arg::MagnitudeRange;
use crate::sky::{Equatorial, SkyError};
use crate::units::{Angle, AngleExt};
use log::{debug, warn};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors produced while loading or saving catalogs
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("catalog has no header row")]
    MissingHeader,
    #[error("required column '{0}' not present in header")]
    MissingColumn(String),
    #[error("line {line}: cannot parse column '{column}' value '{value}'")]
    InvalidValue {
        line: usize,
        column: String,
        value: String,
    },
    #[error("line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("source {id}: {source}")]
    InvalidCoordinate {
        id: u64,
        #[source]
        source: SkyError,
    },
    #[error("CSV error at line {line}: {source}")]
    Csv {
        line: u64,
        #[source]
        source: csv::Error,
    },
    #[error("unsupported catalog format '{0}' (expected .json or .csv)")]
    UnsupportedFormat(String),
}

/// A single catalog entry
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub id: u64,
    pub position: Equatorial,
    /// Magnitude in the catalog's band, if measured
    pub mag: Option<f64>,
    pub mag_err: Option<f64>,
    /// Proper motion in RA (times cos dec), mas/yr
    pub pm_ra: Option<f64>,
    /// Proper motion in Dec, mas/yr
    pub pm_dec: Option<f64>,
}

impl Source {
    /// Source with only an id and a position
    pub fn new(id: u64, position: Equatorial) -> Self {
        Self {
            id,
            position,
            mag: None,
            mag_err: None,
            pm_ra: None,
            pm_dec: None,
        }
    }

    pub fn with_mag(mut self, mag: f64) -> Self {
        self.mag = Some(mag);
        self
    }

    pub fn with_proper_motion(mut self, pm_ra: f64, pm_dec: f64) -> Self {
        self.pm_ra = Some(pm_ra);
        self.pm_dec = Some(pm_dec);
        self
    }
}

/// On-disk representation of a source
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SourceRecord {
    id: u64,
    ra: f64,
    dec: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mag: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mag_err: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pm_ra: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pm_dec: Option<f64>,
}

impl SourceRecord {
    fn into_source(self) -> Result<Source, CatalogError> {
        let position = Equatorial::try_from_degrees(self.ra, self.dec).map_err(|source| {
            CatalogError::InvalidCoordinate {
                id: self.id,
                source,
            }
        })?;
        Ok(Source {
            id: self.id,
            position,
            mag: self.mag,
            mag_err: self.mag_err,
            pm_ra: self.pm_ra,
            pm_dec: self.pm_dec,
        })
    }

    fn from_source(source: &Source) -> Self {
        Self {
            id: source.id,
            ra: source.position.ra_degrees(),
            dec: source.position.dec_degrees(),
            mag: source.mag,
            mag_err: source.mag_err,
            pm_ra: source.pm_ra,
            pm_dec: source.pm_dec,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    name: String,
    #[serde(default)]
    epoch: Option<f64>,
    sources: Vec<SourceRecord>,
}

/// An in-memory catalog of point sources
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceCatalog {
    /// Human-readable label used in logs and reports
    pub name: String,
    /// Epoch of the positions in Julian years, if known
    pub epoch: Option<f64>,
    sources: Vec<Source>,
}

impl SourceCatalog {
    pub fn new(name: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            name: name.into(),
            epoch: None,
            sources,
        }
    }

    pub fn with_epoch(mut self, epoch: f64) -> Self {
        self.epoch = Some(epoch);
        self
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Source> {
        self.sources.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Source> {
        self.sources.iter()
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// All positions, in catalog order
    pub fn positions(&self) -> Vec<Equatorial> {
        self.sources.iter().map(|s| s.position).collect()
    }

    /// New catalog holding the sources that satisfy `predicate`
    pub fn filter<F>(&self, predicate: F) -> SourceCatalog
    where
        F: Fn(&Source) -> bool,
    {
        SourceCatalog {
            name: self.name.clone(),
            epoch: self.epoch,
            sources: self.sources.iter().filter(|s| predicate(s)).cloned().collect(),
        }
    }

    /// Sources with a magnitude inside `range`; sources without one are dropped
    pub fn in_magnitude_range(&self, range: &MagnitudeRange) -> SourceCatalog {
        self.filter(|s| s.mag.is_some_and(|m| range.contains(m)))
    }

    /// Sources within `radius` of `center`
    pub fn in_field(&self, center: &Equatorial, radius: Angle) -> SourceCatalog {
        let radius_rad = radius.as_radians();
        self.filter(|s| center.angular_distance_radians(&s.position) <= radius_rad)
    }

    /// Copy of the catalog with proper motions applied up to `epoch`.
    ///
    /// Sources without proper motion keep their position. A catalog with no
    /// epoch of its own is returned unchanged.
    pub fn propagated_to(&self, epoch: f64) -> SourceCatalog {
        let Some(from) = self.epoch else {
            warn!(
                "catalog '{}' has no epoch; skipping proper motion propagation",
                self.name
            );
            return self.clone();
        };

        let years = epoch - from;
        let mut moved = 0usize;
        let sources = self
            .sources
            .iter()
            .map(|s| match (s.pm_ra, s.pm_dec) {
                (Some(pm_ra), Some(pm_dec)) => {
                    moved += 1;
                    Source {
                        position: s.position.propagate_proper_motion(pm_ra, pm_dec, years),
                        ..s.clone()
                    }
                }
                _ => s.clone(),
            })
            .collect();

        debug!(
            "propagated {moved}/{} sources of '{}' from J{from:.2} to J{epoch:.2}",
            self.len(),
            self.name
        );

        SourceCatalog {
            name: self.name.clone(),
            epoch: Some(epoch),
            sources,
        }
    }

    /// Load a catalog, choosing the parser from the file extension
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let contents = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut catalog = match extension.as_str() {
            "json" => Self::from_json_str(&contents)?,
            "csv" => Self::from_csv_str(&contents)?,
            other => return Err(CatalogError::UnsupportedFormat(other.to_string())),
        };

        if catalog.name.is_empty() {
            catalog.name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("catalog")
                .to_string();
        }

        debug!("loaded {} sources from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Parse the JSON catalog format
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        let sources = file
            .sources
            .into_iter()
            .map(SourceRecord::into_source)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: file.name,
            epoch: file.epoch,
            sources,
        })
    }

    /// Parse the CSV catalog format
    pub fn from_csv_str(text: &str) -> Result<Self, CatalogError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut reader = csv::ReaderBuilder::new()
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers: csv::StringRecord = reader
            .headers()?
            .iter()
            .map(|h| h.to_ascii_lowercase())
            .collect();
        if headers.is_empty() {
            return Err(CatalogError::MissingHeader);
        }
        for column in REQUIRED_CSV_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(CatalogError::MissingColumn(column.to_string()));
            }
        }

        let mut sources = Vec::new();
        for result in reader.records() {
            let record = result?;
            let row: CsvRow = record
                .deserialize(Some(&headers))
                .map_err(|e| invalid_csv_value(e, &headers, &record))?;
            sources.push(row.into_record().into_source()?);
        }

        Ok(Self::new(String::new(), sources))
    }

    /// Save in the JSON catalog format
    pub fn save_json(&self, path: &Path) -> Result<(), CatalogError> {
        let file = CatalogFile {
            name: self.name.clone(),
            epoch: self.epoch,
            sources: self.sources.iter().map(SourceRecord::from_source).collect(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        std::fs::write(path, json).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save in the CSV catalog format; missing values are written blank
    pub fn save_csv(&self, path: &Path) -> Result<(), CatalogError> {
        let optional = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();

        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(CSV_COLUMNS)?;
        for s in &self.sources {
            writer.write_record(&[
                s.id.to_string(),
                s.position.ra_degrees().to_string(),
                s.position.dec_degrees().to_string(),
                optional(s.mag),
                optional(s.mag_err),
                optional(s.pm_ra),
                optional(s.pm_dec),
            ])?;
        }
        writer.flush().map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl FromIterator<Source> for SourceCatalog {
    fn from_iter<I: IntoIterator<Item = Source>>(iter: I) -> Self {
        Self::new(String::new(), iter.into_iter().collect())
    }
}

const CSV_COLUMNS: [&str; 7] = ["id", "ra", "dec", "mag", "mag_err", "pm_ra", "pm_dec"];
const REQUIRED_CSV_COLUMNS: [&str; 3] = ["id", "ra", "dec"];

/// One CSV row; unknown columns are ignored
#[derive(Debug, Deserialize)]
struct CsvRow {
    id: u64,
    ra: f64,
    dec: f64,
    #[serde(default, deserialize_with = "missing_as_none")]
    mag: Option<f64>,
    #[serde(default, deserialize_with = "missing_as_none")]
    mag_err: Option<f64>,
    #[serde(default, deserialize_with = "missing_as_none")]
    pm_ra: Option<f64>,
    #[serde(default, deserialize_with = "missing_as_none")]
    pm_dec: Option<f64>,
}

impl CsvRow {
    fn into_record(self) -> SourceRecord {
        SourceRecord {
            id: self.id,
            ra: self.ra,
            dec: self.dec,
            mag: self.mag,
            mag_err: self.mag_err,
            pm_ra: self.pm_ra,
            pm_dec: self.pm_dec,
        }
    }
}

fn is_missing(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case("nan") || value.eq_ignore_ascii_case("null")
}

/// Blank, `nan` and `null` cells are missing values
fn missing_as_none<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None => Ok(None),
        Some(v) if is_missing(v) => Ok(None),
        Some(v) => v
            .parse::<f64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid number '{v}'"))),
    }
}

impl From<csv::Error> for CatalogError {
    fn from(source: csv::Error) -> Self {
        if let csv::ErrorKind::UnequalLengths {
            pos,
            expected_len,
            len,
        } = source.kind()
        {
            return CatalogError::FieldCount {
                line: pos.as_ref().map_or(0, |p| p.line() as usize),
                expected: *expected_len as usize,
                found: *len as usize,
            };
        }
        let line = source.position().map_or(0, |p| p.line());
        CatalogError::Csv { line, source }
    }
}

/// Name the offending column when the deserializer reports one
fn invalid_csv_value(
    error: csv::Error,
    headers: &csv::StringRecord,
    record: &csv::StringRecord,
) -> CatalogError {
    let field = match error.kind() {
        csv::ErrorKind::Deserialize { err, .. } => err.field(),
        _ => None,
    };
    match field {
        Some(i) => CatalogError::InvalidValue {
            line: record.position().map_or(0, |p| p.line() as usize),
            column: headers.get(i as usize).unwrap_or_default().to_string(),
            value: record.get(i as usize).unwrap_or_default().to_string(),
        },
        None => error.into(),
    }
}
