//! Tabular data parsed from CSV text
//!
//! Columns are typed by inspecting every cell: integers, floats, booleans and
//! free text. Missing cells are tracked per column.

use std::collections::HashMap;
use std::fmt;

use csv::{ReaderBuilder, StringRecord};

use crate::error::AnalysisError;

/// Cell texts treated as missing values
pub const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

const TRUE_VALUES: &[&str] = &["True", "TRUE", "true"];
const FALSE_VALUES: &[&str] = &["False", "FALSE", "false"];

/// Inferred column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dtype {
    Bool,
    Float64,
    Int64,
    Object,
}

impl Dtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dtype::Bool => "bool",
            Dtype::Float64 => "float64",
            Dtype::Int64 => "int64",
            Dtype::Object => "object",
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column values. Integer and boolean columns never hold missing values;
/// a missing cell promotes an integer column to float and a boolean one to
/// text.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Int(Vec<i64>),
    Float(Vec<Option<f64>>),
    Bool(Vec<bool>),
    Text(Vec<Option<String>>),
}

/// A named column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn len(&self) -> usize {
        match &self.data {
            ColumnData::Int(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Bool(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dtype(&self) -> Dtype {
        match &self.data {
            ColumnData::Int(_) => Dtype::Int64,
            ColumnData::Float(_) => Dtype::Float64,
            ColumnData::Bool(_) => Dtype::Bool,
            ColumnData::Text(_) => Dtype::Object,
        }
    }

    /// Numeric columns take part in outlier analysis
    pub fn is_numeric(&self) -> bool {
        matches!(self.data, ColumnData::Int(_) | ColumnData::Float(_))
    }

    pub fn null_count(&self) -> usize {
        match &self.data {
            ColumnData::Int(_) | ColumnData::Bool(_) => 0,
            ColumnData::Float(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnData::Text(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }

    pub fn non_null_count(&self) -> usize {
        self.len() - self.null_count()
    }

    /// Values as floats, row-aligned. `None` for non-numeric columns.
    pub fn numeric_values(&self) -> Option<Vec<Option<f64>>> {
        match &self.data {
            ColumnData::Int(v) => Some(v.iter().map(|&x| Some(x as f64)).collect()),
            ColumnData::Float(v) => Some(v.clone()),
            _ => None,
        }
    }

    /// Non-missing values rendered as text, row-aligned. `None` for numeric
    /// columns.
    pub fn categorical_values(&self) -> Option<Vec<Option<String>>> {
        match &self.data {
            ColumnData::Bool(v) => Some(v.iter().map(|&b| Some(bool_text(b).to_string())).collect()),
            ColumnData::Text(v) => Some(v.clone()),
            _ => None,
        }
    }
}

pub(crate) fn bool_text(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// An ordered set of equally long columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataFrame {
    columns: Vec<Column>,
    rows: usize,
}

impl DataFrame {
    /// Build a frame from columns of equal length
    pub fn new(columns: Vec<Column>) -> Result<Self, AnalysisError> {
        let rows = columns.first().map(Column::len).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.len() != rows) {
            return Err(AnalysisError::Unexpected(format!(
                "column '{}' has {} values, expected {}",
                bad.name,
                bad.len(),
                rows
            )));
        }
        Ok(Self { columns, rows })
    }

    /// Parse CSV text. The first non-blank line is the header; a header
    /// without data rows gives a frame with zero rows.
    pub fn from_csv(text: &str) -> Result<Self, AnalysisError> {
        if text.trim().is_empty() {
            return Err(AnalysisError::Empty);
        }
        check_quotes_closed(text)?;

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut records = reader.records();

        let header = loop {
            match records.next() {
                None => return Err(AnalysisError::Empty),
                Some(Err(e)) => return Err(classify_csv_error(&e)),
                Some(Ok(record)) if is_blank(&record) => continue,
                Some(Ok(record)) => break record,
            }
        };

        let names = normalize_headers(&header);
        let width = names.len();
        let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); width];

        for result in records {
            let record = result.map_err(|e| classify_csv_error(&e))?;
            if is_blank(&record) {
                continue;
            }

            if record.len() > width {
                let line = record.position().map(|p| p.line()).unwrap_or_default();
                return Err(AnalysisError::Parse(format!(
                    "Expected {} fields in line {}, saw {}",
                    width,
                    line,
                    record.len()
                )));
            }

            for (idx, column) in cells.iter_mut().enumerate() {
                column.push(record.get(idx).and_then(to_cell));
            }
        }

        let columns = names
            .into_iter()
            .zip(cells)
            .map(|(name, values)| Column::new(name, infer_column(values)))
            .collect();

        Self::new(columns)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn numeric_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_numeric())
    }
}

#[derive(Clone, Copy)]
enum QuoteState {
    FieldStart,
    Unquoted,
    Quoted { row: usize },
    ClosingQuote { row: usize },
}

/// Reject a quoted field still open at end of input. The reader would
/// otherwise swallow every following line into that one cell.
fn check_quotes_closed(text: &str) -> Result<(), AnalysisError> {
    let mut state = QuoteState::FieldStart;
    let mut row = 0;

    for c in text.chars() {
        state = match (state, c) {
            (QuoteState::FieldStart, '"') => QuoteState::Quoted { row },
            (QuoteState::Quoted { row: start }, '"') => QuoteState::ClosingQuote { row: start },
            (QuoteState::Quoted { row: start }, _) => QuoteState::Quoted { row: start },
            // `""` inside a quoted field is an escaped quote
            (QuoteState::ClosingQuote { row: start }, '"') => QuoteState::Quoted { row: start },
            (_, ',' | '\n') => QuoteState::FieldStart,
            (QuoteState::FieldStart, '\r') => QuoteState::FieldStart,
            _ => QuoteState::Unquoted,
        };
        if c == '\n' {
            row += 1;
        }
    }

    match state {
        QuoteState::Quoted { row } => Err(AnalysisError::Parse(format!(
            "EOF inside string starting at row {}",
            row
        ))),
        _ => Ok(()),
    }
}

fn is_blank(record: &StringRecord) -> bool {
    record.len() == 0 || (record.len() == 1 && record[0].trim().is_empty())
}

fn to_cell(raw: &str) -> Option<String> {
    if NA_VALUES.contains(&raw) {
        None
    } else {
        Some(raw.to_string())
    }
}

fn classify_csv_error(err: &csv::Error) -> AnalysisError {
    match err.kind() {
        csv::ErrorKind::Utf8 { .. } | csv::ErrorKind::UnequalLengths { .. } => {
            AnalysisError::Parse(err.to_string())
        }
        _ => AnalysisError::Unexpected(err.to_string()),
    }
}

/// Blank names become `Unnamed: <i>`, repeats get a `.1`, `.2` ... suffix.
fn normalize_headers(header: &StringRecord) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::with_capacity(header.len());

    for (idx, raw) in header.iter().enumerate() {
        let base = if raw.trim().is_empty() {
            format!("Unnamed: {}", idx)
        } else {
            raw.to_string()
        };

        let mut name = base.clone();
        if let Some(&next) = seen.get(&base) {
            let mut suffix = next;
            loop {
                name = format!("{}.{}", base, suffix);
                suffix += 1;
                if !seen.contains_key(&name) {
                    break;
                }
            }
            seen.insert(base, suffix);
        }
        seen.entry(name.clone()).or_insert(1);
        names.push(name);
    }

    names
}

fn parse_float(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok()
}

fn infer_column(values: Vec<Option<String>>) -> ColumnData {
    let present: Vec<&str> = values.iter().flatten().map(String::as_str).collect();
    let has_nulls = present.len() < values.len();

    if values.is_empty() {
        return ColumnData::Text(values);
    }
    if present.is_empty() {
        return ColumnData::Float(vec![None; values.len()]);
    }

    if !has_nulls {
        let ints: Option<Vec<i64>> = present.iter().map(|s| s.trim().parse().ok()).collect();
        if let Some(ints) = ints {
            return ColumnData::Int(ints);
        }
    }

    if present.iter().all(|s| parse_float(s).is_some()) {
        return ColumnData::Float(
            values
                .iter()
                .map(|v| v.as_deref().and_then(parse_float).filter(|x| !x.is_nan()))
                .collect(),
        );
    }

    if !has_nulls {
        let bools: Option<Vec<bool>> = present
            .iter()
            .map(|s| {
                if TRUE_VALUES.contains(s) {
                    Some(true)
                } else if FALSE_VALUES.contains(s) {
                    Some(false)
                } else {
                    None
                }
            })
            .collect();
        if let Some(bools) = bools {
            return ColumnData::Bool(bools);
        }
    }

    ColumnData::Text(values)
}
