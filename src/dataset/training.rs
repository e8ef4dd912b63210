//! Historical training records and their CSV loader.
//!
//! Header columns are matched by feature name (canonical or legacy spelling)
//! and by the ground-truth columns `YS (MPa)` / `UTS (MPa)`. Other columns
//! are ignored. Missing feature columns take their defaults: 0 wt% for an
//! element, the domain default for a processing parameter.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::DatasetError;
use crate::schema::{feature_index, feature_names, Features, ELEMENT_COUNT, FEATURE_COUNT};
use crate::types::{from_features, to_features, Composition, Processing, TargetProperty};

/// Parse errors logged individually before going quiet.
const MAX_LOGGED_ERRORS: usize = 10;

/// One historical data point.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRecord {
    pub composition: Composition,
    pub processing: Processing,
    /// Measured yield strength (MPa)
    pub ys: Option<f64>,
    /// Measured ultimate tensile strength (MPa)
    pub uts: Option<f64>,
}

impl TrainingRecord {
    /// Ground truth for `target`, if the record carries it.
    pub fn actual(&self, target: TargetProperty) -> Option<f64> {
        match target {
            TargetProperty::YieldStrength => self.ys,
            TargetProperty::UltimateTensileStrength => self.uts,
        }
    }
}

/// Load statistics for one dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetInfo {
    /// Source file path, or `"<memory>"`
    pub source: String,
    pub record_count: usize,
    /// Rows dropped because they carried no composition
    pub skipped_rows: usize,
    /// Rows dropped because a field failed to parse
    pub error_rows: usize,
}

/// Immutable collection of training records.
///
/// Every record's composition is renormalized to sum to 100 wt% on entry.
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    records: Vec<TrainingRecord>,
    info: DatasetInfo,
}

impl TrainingSet {
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            info: DatasetInfo {
                source: "<empty>".to_string(),
                ..DatasetInfo::default()
            },
        }
    }

    /// Build from in-memory records.
    pub fn from_records(records: Vec<TrainingRecord>) -> Self {
        let records: Vec<TrainingRecord> = records.into_iter().map(normalize_record).collect();
        Self {
            info: DatasetInfo {
                source: "<memory>".to_string(),
                record_count: records.len(),
                ..DatasetInfo::default()
            },
            records,
        }
    }

    /// Load a CSV file.
    pub fn load_csv(path: &Path) -> Result<Self, DatasetError> {
        let file = File::open(path).map_err(|source| DatasetError::Io {
            origin: path.display().to_string(),
            source,
        })?;
        let mut set = Self::parse_csv(BufReader::new(file), &path.display().to_string())?;
        set.info.source = path.display().to_string();
        Ok(set)
    }

    /// Parse CSV text from any buffered reader.
    pub fn parse_csv(reader: impl BufRead, source: &str) -> Result<Self, DatasetError> {
        let mut lines = reader.lines();

        let header = lines
            .next()
            .ok_or_else(|| DatasetError::Empty(source.to_string()))?
            .map_err(|e| DatasetError::Io {
                origin: source.to_string(),
                source: e,
            })?;
        let columns = ColumnMap::from_header(&header);
        if columns.features.iter().all(Option::is_none) {
            return Err(DatasetError::MissingColumns(format!(
                "{source}: no recognised feature columns in header"
            )));
        }

        let mut records = Vec::new();
        let mut skipped = 0usize;
        let mut errors = 0usize;

        for (i, line_result) in lines.enumerate() {
            let line_num = i + 2;
            let outcome = match line_result {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => parse_row(&line, &columns),
                Err(e) => Err(format!("unreadable line: {e}")),
            };

            match outcome {
                Ok(Some(record)) => records.push(normalize_record(record)),
                Ok(None) => skipped += 1,
                Err(e) => {
                    if errors < MAX_LOGGED_ERRORS {
                        tracing::warn!(source, line = line_num, error = %e, "Skipping unparsable row");
                    } else if errors == MAX_LOGGED_ERRORS {
                        tracing::warn!(source, "Further row errors suppressed");
                    }
                    errors += 1;
                }
            }
        }

        let info = DatasetInfo {
            source: source.to_string(),
            record_count: records.len(),
            skipped_rows: skipped,
            error_rows: errors,
        };
        tracing::info!(
            source,
            records = info.record_count,
            skipped = info.skipped_rows,
            errors = info.error_rows,
            "Training data loaded"
        );
        Ok(Self { records, info })
    }

    pub fn records(&self) -> &[TrainingRecord] {
        &self.records
    }

    pub fn info(&self) -> &DatasetInfo {
        &self.info
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn normalize_record(mut record: TrainingRecord) -> TrainingRecord {
    record.composition = record.composition.normalized();
    record
}

// ============================================================================
// CSV Parsing
// ============================================================================

/// Header position of every recognised column.
#[derive(Debug)]
struct ColumnMap {
    features: [Option<usize>; FEATURE_COUNT],
    /// Canonical feature names, for row error messages
    names: [&'static str; FEATURE_COUNT],
    /// Value of a feature whose cell is absent or blank
    defaults: Features,
    ys: Option<usize>,
    uts: Option<usize>,
}

impl ColumnMap {
    fn from_header(header: &str) -> Self {
        let mut map = Self {
            features: [None; FEATURE_COUNT],
            names: feature_names(),
            defaults: to_features(&Composition::default(), &Processing::default()),
            ys: None,
            uts: None,
        };
        for (col, name) in csv_split(header).iter().enumerate() {
            let name = name.trim().trim_start_matches('\u{feff}');
            if let Some(idx) = feature_index(name) {
                map.features[idx].get_or_insert(col);
            } else if is_target_column(name, TargetProperty::YieldStrength) {
                map.ys.get_or_insert(col);
            } else if is_target_column(name, TargetProperty::UltimateTensileStrength) {
                map.uts.get_or_insert(col);
            }
        }
        map
    }
}

fn is_target_column(name: &str, target: TargetProperty) -> bool {
    name.eq_ignore_ascii_case(target.dataset_column()) || name.eq_ignore_ascii_case(target.code())
}

/// Parse one row. `Ok(None)` means the row carries no composition.
fn parse_row(line: &str, columns: &ColumnMap) -> Result<Option<TrainingRecord>, String> {
    let fields = csv_split(line);

    let mut features = columns.defaults;
    for (idx, col) in columns.features.iter().enumerate() {
        if let Some(value) = get_f64(&fields, *col, columns.names[idx])? {
            features[idx] = value;
        }
    }

    if features[..ELEMENT_COUNT].iter().sum::<f64>() <= 0.0 {
        return Ok(None);
    }
    if let Some(pos) = features[..ELEMENT_COUNT].iter().position(|v| *v < 0.0) {
        return Err(format!("negative amount for {}", columns.names[pos]));
    }

    let (composition, processing) = from_features(&features);
    Ok(Some(TrainingRecord {
        composition,
        processing,
        ys: get_f64(&fields, columns.ys, "YS")?,
        uts: get_f64(&fields, columns.uts, "UTS")?,
    }))
}

/// Split a CSV line, honouring double-quoted fields.
fn csv_split(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    // Escaped quote ("")
                    if chars.peek() == Some(&'"') {
                        current.push('"');
                        chars.next();
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

/// Read a numeric field. Blank / NaN / null cells are `None`; anything
/// else that is not a finite number is an error.
fn get_f64(fields: &[String], idx: Option<usize>, name: &str) -> Result<Option<f64>, String> {
    let Some(raw) = idx.and_then(|i| fields.get(i)) else {
        return Ok(None);
    };
    let s = raw.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("nan") || s.eq_ignore_ascii_case("null") || s == "-" {
        return Ok(None);
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(format!("{name}: cannot parse {s:?} as a number")),
    }
}
