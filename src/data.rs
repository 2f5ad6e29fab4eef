use crate::error::{ReportError, Result};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// A single table cell.
///
/// Cells are typed once at load time so that group keys sort the way a
/// dataframe would sort them: `1 < 2 < 10` rather than `"1" < "10" < "2"`.
#[derive(Debug, Clone)]
pub enum Datum {
    Number(f64),
    Text(String),
    Missing,
}

impl Datum {
    /// Type a raw cell. Empty cells and NaN are missing; infinities stay text.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Datum::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_nan() => Datum::Missing,
            Ok(n) if n.is_finite() => Datum::Number(n),
            _ => Datum::Text(trimmed.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Datum::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Datum::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Label used on axes, legends and facet titles.
    pub fn label(&self) -> String {
        match self {
            Datum::Missing => "missing".to_string(),
            other => other.to_string(),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Datum::Number(_) => 0,
            Datum::Text(_) => 1,
            Datum::Missing => 2,
        }
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Datum::Number(n) => write!(f, "{}", n),
            Datum::Text(s) => f.write_str(s),
            Datum::Missing => Ok(()),
        }
    }
}

// Numbers, then text, then missing last.
impl Ord for Datum {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Datum::Number(a), Datum::Number(b)) => a.total_cmp(b),
            (Datum::Text(a), Datum::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Datum {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Datum {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Datum {}

/// The in-memory passenger table. Read-only once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Datum>>,
}

impl Dataset {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Datum>>) -> Self {
        Self { headers, rows }
    }

    /// Build from raw string cells, typing each one.
    pub fn from_strings(headers: &[&str], rows: &[Vec<&str>]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| Datum::parse(c)).collect())
                .collect(),
        }
    }

    /// Load a dataset from disk. `.json` files are read as an array of
    /// objects; everything else is read as CSV with a header row.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| ReportError::Load {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let dataset = if is_json {
            let value: Value = serde_json::from_reader(file).map_err(|e| ReportError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            Self::from_json(&value).map_err(|message| ReportError::Parse {
                path: path.to_path_buf(),
                message,
            })?
        } else {
            read_csv(file, path)?
        };

        info!(
            path = %path.display(),
            rows = dataset.len(),
            columns = dataset.headers.len(),
            "loaded dataset"
        );
        Ok(dataset)
    }

    /// Read CSV (with a header row) from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        read_csv(reader, Path::new("<reader>"))
    }

    /// Create a Dataset from a JSON array of objects
    pub fn from_json(value: &Value) -> std::result::Result<Self, String> {
        let array = value
            .as_array()
            .ok_or_else(|| "input data must be a JSON array of objects".to_string())?;

        let first_obj = array
            .first()
            .ok_or_else(|| "input data array is empty".to_string())?
            .as_object()
            .ok_or_else(|| "items in array must be objects".to_string())?;

        let headers: Vec<String> = first_obj.keys().cloned().collect();

        let mut rows = Vec::with_capacity(array.len());
        for item in array {
            let obj = item
                .as_object()
                .ok_or_else(|| "items in array must be objects".to_string())?;

            let mut row = Vec::with_capacity(headers.len());
            for header in &headers {
                let cell = match obj.get(header) {
                    Some(Value::String(s)) => Datum::parse(s),
                    Some(Value::Number(n)) => n.as_f64().map(Datum::Number).unwrap_or(Datum::Missing),
                    Some(Value::Bool(b)) => Datum::Number(if *b { 1.0 } else { 0.0 }),
                    Some(Value::Null) | None => Datum::Missing,
                    _ => return Err(format!("unsupported value type for field '{}'", header)),
                };
                row.push(cell);
            }
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, or a schema error naming what is available.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ReportError::Schema {
                column: name.to_string(),
                available: self.headers.clone(),
            })
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    /// Copy of the table restricted to `columns` (in the given order,
    /// duplicates collapsed).
    pub fn project(&self, columns: &[&str]) -> Result<Dataset> {
        let mut names: Vec<&str> = Vec::new();
        for c in columns {
            if !names.contains(c) {
                names.push(c);
            }
        }
        let indices = names
            .iter()
            .map(|c| self.column_index(c))
            .collect::<Result<Vec<_>>>()?;

        Ok(Dataset {
            headers: names.iter().map(|c| c.to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        })
    }
}

fn read_csv<R: Read>(reader: R, path: &Path) -> Result<Dataset> {
    let parse_err = |e: csv::Error| ReportError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(parse_err)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(parse_err)?;
        rows.push(record.iter().map(Datum::parse).collect());
    }

    Ok(Dataset { headers, rows })
}
