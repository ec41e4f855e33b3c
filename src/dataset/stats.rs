//! Descriptive statistics and IQR outlier detection

use std::collections::HashMap;

use crate::dataset::frame::{Column, DataFrame};
use crate::error::AnalysisError;

/// Multiplier applied to the IQR when placing the fences
pub const IQR_FACTOR: f64 = 1.5;

/// Percentile of sorted values using linear interpolation between the two
/// nearest ranks. NaN for an empty slice.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }

    let pos = (sorted.len() - 1) as f64 * q;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;

    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator)
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

fn sorted_present(values: &[Option<f64>]) -> Vec<f64> {
    let mut present: Vec<f64> = values.iter().flatten().copied().collect();
    present.sort_by(|a, b| a.total_cmp(b));
    present
}

/// Inclusive range outside of which a value counts as an outlier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierBounds {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
}

impl OutlierBounds {
    /// Fences from the non-missing values; `None` when every value is missing
    pub fn from_values(values: &[Option<f64>]) -> Option<Self> {
        let sorted = sorted_present(values);
        if sorted.is_empty() {
            return None;
        }

        let q1 = quantile(&sorted, 0.25);
        let q3 = quantile(&sorted, 0.75);
        let iqr = q3 - q1;

        Some(Self {
            q1,
            q3,
            lower: q1 - IQR_FACTOR * iqr,
            upper: q3 + IQR_FACTOR * iqr,
        })
    }

    pub fn is_outlier(&self, value: f64) -> bool {
        value < self.lower || value > self.upper
    }

    /// Rows whose value falls outside the fences; missing rows never count
    pub fn count(&self, values: &[Option<f64>]) -> usize {
        values
            .iter()
            .flatten()
            .filter(|&&v| self.is_outlier(v))
            .count()
    }
}

/// Outcome of the IQR check for one numeric column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnOutliers {
    OnlyNulls { column: String },
    Counted { column: String, count: usize },
}

impl ColumnOutliers {
    pub fn column(&self) -> &str {
        match self {
            ColumnOutliers::OnlyNulls { column } | ColumnOutliers::Counted { column, .. } => column,
        }
    }
}

/// IQR analysis over all numeric columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutlierReport {
    NoNumericColumns,
    Columns(Vec<ColumnOutliers>),
}

impl OutlierReport {
    pub fn for_frame(df: &DataFrame) -> Self {
        let columns: Vec<ColumnOutliers> = df
            .numeric_columns()
            .filter_map(|col| col.numeric_values().map(|values| (col, values)))
            .map(|(col, values)| match OutlierBounds::from_values(&values) {
                None => ColumnOutliers::OnlyNulls {
                    column: col.name.clone(),
                },
                Some(bounds) => ColumnOutliers::Counted {
                    column: col.name.clone(),
                    count: bounds.count(&values),
                },
            })
            .collect();

        if columns.is_empty() {
            OutlierReport::NoNumericColumns
        } else {
            OutlierReport::Columns(columns)
        }
    }

    /// Outlier count for a column, if it was counted
    pub fn count_for(&self, column: &str) -> Option<usize> {
        match self {
            OutlierReport::NoNumericColumns => None,
            OutlierReport::Columns(cols) => cols.iter().find_map(|c| match c {
                ColumnOutliers::Counted { column: name, count } if name == column => Some(*count),
                _ => None,
            }),
        }
    }
}

/// One cell of the statistics table
#[derive(Debug, Clone, PartialEq)]
pub enum StatCell {
    Number(f64),
    Text(String),
    Missing,
}

/// Statistics for one column, keyed by row label
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: String,
    pub numeric: bool,
    pub cells: HashMap<&'static str, StatCell>,
}

/// Statistics over every column, mixing numeric and categorical rows
#[derive(Debug, Clone, PartialEq)]
pub struct Description {
    pub rows: Vec<&'static str>,
    pub columns: Vec<ColumnSummary>,
}

const CATEGORICAL_ROWS: [&str; 4] = ["count", "unique", "top", "freq"];
const NUMERIC_ROWS: [&str; 7] = ["mean", "std", "min", "25%", "50%", "75%", "max"];

impl Description {
    /// Summarize every column of the frame
    pub fn for_frame(df: &DataFrame) -> Result<Self, AnalysisError> {
        if df.columns().is_empty() {
            return Err(AnalysisError::Statistics(
                "Cannot describe a DataFrame without columns".to_string(),
            ));
        }

        let has_numeric = df.columns().iter().any(Column::is_numeric);
        let has_categorical = df.columns().iter().any(|c| !c.is_numeric());

        let mut rows = vec!["count"];
        if has_categorical {
            rows.extend_from_slice(&CATEGORICAL_ROWS[1..]);
        }
        if has_numeric {
            rows.extend_from_slice(&NUMERIC_ROWS);
        }

        let columns = df.columns().iter().map(summarize).collect();

        Ok(Self { rows, columns })
    }

    pub fn cell(&self, column: &str, row: &str) -> Option<&StatCell> {
        self.columns
            .iter()
            .find(|c| c.name == column)
            .and_then(|c| c.cells.get(row))
    }
}

fn summarize(col: &Column) -> ColumnSummary {
    let mut cells = HashMap::new();

    if let Some(values) = col.numeric_values() {
        let sorted = sorted_present(&values);
        let number = |v: f64| {
            if v.is_nan() {
                StatCell::Missing
            } else {
                StatCell::Number(v)
            }
        };

        cells.insert("count", StatCell::Number(sorted.len() as f64));
        cells.insert("mean", number(mean(&sorted)));
        cells.insert("std", number(sample_std(&sorted)));
        cells.insert("min", number(quantile(&sorted, 0.0)));
        cells.insert("25%", number(quantile(&sorted, 0.25)));
        cells.insert("50%", number(quantile(&sorted, 0.5)));
        cells.insert("75%", number(quantile(&sorted, 0.75)));
        cells.insert("max", number(quantile(&sorted, 1.0)));

        return ColumnSummary {
            name: col.name.clone(),
            numeric: true,
            cells,
        };
    }

    let values = col.categorical_values().unwrap_or_default();
    let present: Vec<&str> = values.iter().flatten().map(String::as_str).collect();

    // Most frequent value; ties go to the value seen first.
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for &v in &present {
        let entry = counts.entry(v).or_insert(0);
        if *entry == 0 {
            order.push(v);
        }
        *entry += 1;
    }
    let top = order.iter().fold(None::<(&str, usize)>, |best, &v| {
        let n = counts[v];
        match best {
            Some((_, m)) if m >= n => best,
            _ => Some((v, n)),
        }
    });

    cells.insert("count", StatCell::Number(present.len() as f64));
    cells.insert("unique", StatCell::Number(order.len() as f64));
    match top {
        Some((value, freq)) => {
            cells.insert("top", StatCell::Text(value.to_string()));
            cells.insert("freq", StatCell::Number(freq as f64));
        }
        None => {
            cells.insert("top", StatCell::Missing);
            cells.insert("freq", StatCell::Missing);
        }
    }

    ColumnSummary {
        name: col.name.clone(),
        numeric: false,
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::frame::ColumnData;

    #[test]
    fn test_quantile_linear_interpolation() {
        let values = [1.0, 2.0, 3.0, 4.0, 100.0];
        assert_eq!(quantile(&values, 0.25), 2.0);
        assert_eq!(quantile(&values, 0.75), 4.0);
        assert_eq!(quantile(&[1.0, 2.0, 3.0, 4.0], 0.25), 1.75);
        assert!(quantile(&[], 0.5).is_nan());
    }

    #[test]
    fn test_planted_outlier() {
        let values: Vec<Option<f64>> = [1.0, 2.0, 3.0, 4.0, 100.0].iter().map(|&v| Some(v)).collect();
        let bounds = OutlierBounds::from_values(&values).unwrap();
        assert_eq!(bounds.lower, -1.0);
        assert_eq!(bounds.upper, 7.0);
        assert_eq!(bounds.count(&values), 1);
    }

    #[test]
    fn test_missing_values_do_not_count() {
        let values = vec![Some(1.0), None, Some(2.0), Some(3.0), None, Some(50.0)];
        let bounds = OutlierBounds::from_values(&values).unwrap();
        assert_eq!(bounds.count(&values), 1);
        assert!(OutlierBounds::from_values(&[None, None]).is_none());
    }

    #[test]
    fn test_outlier_report_variants() {
        let df = DataFrame::new(vec![
            Column::new("name", ColumnData::Text(vec![Some("a".into()), Some("b".into())])),
            Column::new("empty", ColumnData::Float(vec![None, None])),
            Column::new("n", ColumnData::Int(vec![1, 2])),
        ])
        .unwrap();

        let report = OutlierReport::for_frame(&df);
        assert_eq!(
            report,
            OutlierReport::Columns(vec![
                ColumnOutliers::OnlyNulls {
                    column: "empty".into()
                },
                ColumnOutliers::Counted {
                    column: "n".into(),
                    count: 0
                },
            ])
        );

        let text_only = DataFrame::new(vec![Column::new(
            "name",
            ColumnData::Text(vec![Some("a".into())]),
        )])
        .unwrap();
        assert_eq!(OutlierReport::for_frame(&text_only), OutlierReport::NoNumericColumns);
    }

    #[test]
    fn test_sample_std() {
        let std = sample_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((std - 2.138089935).abs() < 1e-6);
        assert!(sample_std(&[1.0]).is_nan());
    }

    #[test]
    fn test_description_rows() {
        let df = DataFrame::new(vec![
            Column::new("city", ColumnData::Text(vec![Some("Rome".into()), Some("Milan".into()), Some("Rome".into())])),
            Column::new("n", ColumnData::Int(vec![1, 2, 3])),
        ])
        .unwrap();

        let desc = Description::for_frame(&df).unwrap();
        assert_eq!(
            desc.rows,
            vec!["count", "unique", "top", "freq", "mean", "std", "min", "25%", "50%", "75%", "max"]
        );
        assert_eq!(desc.cell("city", "top"), Some(&StatCell::Text("Rome".into())));
        assert_eq!(desc.cell("city", "freq"), Some(&StatCell::Number(2.0)));
        assert_eq!(desc.cell("n", "50%"), Some(&StatCell::Number(2.0)));
        assert_eq!(desc.cell("n", "top"), None);
    }

    #[test]
    fn test_description_without_columns_fails() {
        let err = Description::for_frame(&DataFrame::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::Statistics(_)));
    }
}
