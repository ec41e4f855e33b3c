//! Plain-text rendering of frames and statistics
//!
//! Layout follows the usual dataframe console conventions: an index column
//! on the left, right-aligned value columns and `NaN` for missing cells.

use std::collections::BTreeMap;

use crate::dataset::frame::{bool_text, Column, ColumnData, DataFrame, Dtype};
use crate::dataset::stats::{ColumnOutliers, Description, OutlierReport, StatCell};

/// Rows shown in the preview
pub const PREVIEW_ROWS: usize = 5;

const MAX_DECIMALS: usize = 6;
const INDEX_BYTES: usize = 128;
const CELL_BYTES: usize = 8;

/// Format floats with the smallest common precision (at least one decimal,
/// at most six) that represents every finite value.
pub fn format_floats(values: &[Option<f64>]) -> Vec<String> {
    let decimals = values
        .iter()
        .flatten()
        .filter(|v| v.is_finite())
        .map(|&v| decimals_needed(v))
        .max()
        .unwrap_or(1)
        .max(1);

    values
        .iter()
        .map(|v| match v {
            None => "NaN".to_string(),
            Some(x) if x.is_nan() => "NaN".to_string(),
            Some(x) if x.is_infinite() => {
                if *x > 0.0 {
                    "inf".to_string()
                } else {
                    "-inf".to_string()
                }
            }
            Some(x) => format!("{:.*}", decimals, x),
        })
        .collect()
}

fn decimals_needed(value: f64) -> usize {
    let tolerance = 1e-9 * value.abs().max(1.0);
    (0..MAX_DECIMALS)
        .find(|&d| {
            let scale = 10f64.powi(d as i32);
            ((value * scale).round() / scale - value).abs() < tolerance
        })
        .unwrap_or(MAX_DECIMALS)
}

/// Render a table with a left-aligned index and right-aligned columns
pub fn render_table(index: &[String], headers: &[String], columns: &[Vec<String>]) -> String {
    let index_width = index.iter().map(|s| s.chars().count()).max().unwrap_or(0);
    let widths: Vec<usize> = headers
        .iter()
        .zip(columns)
        .map(|(h, cells)| {
            cells
                .iter()
                .map(|c| c.chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = Vec::with_capacity(index.len() + 1);

    let mut header_line = " ".repeat(index_width);
    for (h, w) in headers.iter().zip(&widths) {
        header_line.push_str(&format!("  {:>width$}", h, width = w));
    }
    lines.push(header_line);

    for (row, label) in index.iter().enumerate() {
        let mut line = format!("{:<width$}", label, width = index_width);
        for (cells, w) in columns.iter().zip(&widths) {
            let cell = cells.get(row).map(String::as_str).unwrap_or("");
            line.push_str(&format!("  {:>width$}", cell, width = w));
        }
        lines.push(line);
    }

    lines.join("\n")
}

/// Cells of rows `[start, end)` of a column, rendered as text
fn column_cells(col: &Column, end: usize) -> Vec<String> {
    match &col.data {
        ColumnData::Int(v) => v.iter().take(end).map(|x| x.to_string()).collect(),
        ColumnData::Float(v) => format_floats(&v[..end.min(v.len())]),
        ColumnData::Bool(v) => v.iter().take(end).map(|&b| bool_text(b).to_string()).collect(),
        ColumnData::Text(v) => v
            .iter()
            .take(end)
            .map(|x| x.clone().unwrap_or_else(|| "NaN".to_string()))
            .collect(),
    }
}

/// First rows of the frame as a table
pub fn preview(df: &DataFrame) -> String {
    if df.row_count() == 0 {
        let names: Vec<&str> = df.columns().iter().map(|c| c.name.as_str()).collect();
        return format!("Empty DataFrame\nColumns: [{}]\nIndex: []", names.join(", "));
    }

    let shown = df.row_count().min(PREVIEW_ROWS);
    let index: Vec<String> = (0..shown).map(|i| i.to_string()).collect();
    let headers: Vec<String> = df.columns().iter().map(|c| c.name.clone()).collect();
    let columns: Vec<Vec<String>> = df.columns().iter().map(|c| column_cells(c, shown)).collect();

    render_table(&index, &headers, &columns)
}

/// Missing values per column, one line each
pub fn null_counts(df: &DataFrame) -> String {
    let name_width = df
        .columns()
        .iter()
        .map(|c| c.name.chars().count())
        .max()
        .unwrap_or(0);
    let counts: Vec<String> = df.columns().iter().map(|c| c.null_count().to_string()).collect();
    let count_width = counts.iter().map(String::len).max().unwrap_or(0);

    df.columns()
        .iter()
        .zip(&counts)
        .map(|(c, n)| {
            format!(
                "{:<nw$}    {:>cw$}",
                c.name,
                n,
                nw = name_width,
                cw = count_width
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a memory estimate for display
pub fn format_memory(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;
    const GB: usize = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} bytes", bytes as f64)
    }
}

/// Schema summary: index range, per-column non-null counts and types
pub fn info(df: &DataFrame) -> String {
    let rows = df.row_count();
    let mut out = String::from("<class 'DataFrame'>\n");

    if rows == 0 {
        out.push_str("RangeIndex: 0 entries\n");
    } else {
        out.push_str(&format!("RangeIndex: {} entries, 0 to {}\n", rows, rows - 1));
    }
    out.push_str(&format!(
        "Data columns (total {} columns):\n",
        df.columns().len()
    ));

    let numbers: Vec<String> = (0..df.columns().len()).map(|i| i.to_string()).collect();
    let non_null: Vec<String> = df
        .columns()
        .iter()
        .map(|c| format!("{} non-null", c.non_null_count()))
        .collect();
    let names: Vec<&str> = df.columns().iter().map(|c| c.name.as_str()).collect();
    let dtypes: Vec<&str> = df.columns().iter().map(|c| c.dtype().as_str()).collect();

    let width = |header: &str, cells: &[&str]| {
        cells
            .iter()
            .map(|c| c.chars().count())
            .chain(std::iter::once(header.len()))
            .max()
            .unwrap_or(0)
    };
    let number_refs: Vec<&str> = numbers.iter().map(String::as_str).collect();
    let non_null_refs: Vec<&str> = non_null.iter().map(String::as_str).collect();
    let w_num = width("#", &number_refs) + 2;
    let w_name = width("Column", &names);
    let w_count = width("Non-Null Count", &non_null_refs);
    let w_dtype = width("Dtype", &dtypes);

    out.push_str(&format!(
        " {:<w_num$}{:<w_name$}  {:<w_count$}  {:<w_dtype$}\n",
        "#", "Column", "Non-Null Count", "Dtype",
    ));
    out.push_str(&format!(
        " {:<w_num$}{:<w_name$}  {:<w_count$}  {:<w_dtype$}\n",
        "---",
        "-".repeat(6),
        "-".repeat(14),
        "-".repeat(5),
    ));
    for i in 0..names.len() {
        out.push_str(&format!(
            " {:<w_num$}{:<w_name$}  {:<w_count$}  {:<w_dtype$}\n",
            numbers[i], names[i], non_null[i], dtypes[i],
        ));
    }

    let mut by_dtype: BTreeMap<Dtype, usize> = BTreeMap::new();
    for col in df.columns() {
        *by_dtype.entry(col.dtype()).or_insert(0) += 1;
    }
    let summary: Vec<String> = by_dtype
        .iter()
        .map(|(dtype, n)| format!("{}({})", dtype, n))
        .collect();
    out.push_str(&format!("dtypes: {}\n", summary.join(", ")));

    let has_text = by_dtype.contains_key(&Dtype::Object);
    let bytes = INDEX_BYTES + CELL_BYTES * rows * df.columns().len();
    let memory = format_memory(bytes);
    let (amount, unit) = memory.split_once(' ').unwrap_or((memory.as_str(), ""));
    out.push_str(&format!(
        "memory usage: {}{} {}\n",
        amount,
        if has_text { "+" } else { "" },
        unit
    ));

    out
}

/// Statistics table, one column per frame column
pub fn description(desc: &Description) -> String {
    let index: Vec<String> = desc.rows.iter().map(|r| r.to_string()).collect();
    let headers: Vec<String> = desc.columns.iter().map(|c| c.name.clone()).collect();

    let columns: Vec<Vec<String>> = desc
        .columns
        .iter()
        .map(|summary| {
            let numbers: Vec<Option<f64>> = desc
                .rows
                .iter()
                .map(|row| match summary.cells.get(row) {
                    Some(StatCell::Number(v)) => Some(*v),
                    _ => None,
                })
                .collect();

            let formatted = if summary.numeric {
                format_floats(&numbers)
            } else {
                // Categorical counts are whole numbers
                numbers
                    .iter()
                    .map(|v| v.map(|x| format!("{}", x as i64)).unwrap_or_default())
                    .collect()
            };

            desc.rows
                .iter()
                .zip(formatted)
                .map(|(row, number)| match summary.cells.get(row) {
                    Some(StatCell::Number(_)) => number,
                    Some(StatCell::Text(t)) => t.clone(),
                    Some(StatCell::Missing) | None => "NaN".to_string(),
                })
                .collect()
        })
        .collect();

    render_table(&index, &headers, &columns)
}

/// One line per numeric column, each prefixed with a newline
pub fn outliers(report: &OutlierReport) -> String {
    match report {
        OutlierReport::NoNumericColumns => "\nNo numeric columns found for IQR analysis.".to_string(),
        OutlierReport::Columns(columns) => columns
            .iter()
            .map(|c| match c {
                ColumnOutliers::OnlyNulls { column } => {
                    format!("\nColumn '{}': only null values.", column)
                }
                ColumnOutliers::Counted { column, count } if *count > 0 => {
                    format!("\nColumn '{}': {} outliers found (IQR)", column, count)
                }
                ColumnOutliers::Counted { column, .. } => {
                    format!("\nColumn '{}': no outliers detected (IQR)", column)
                }
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_floats_common_precision() {
        let values = vec![Some(1.0), Some(2.5), None, Some(3.125)];
        assert_eq!(format_floats(&values), vec!["1.000", "2.500", "NaN", "3.125"]);
        assert_eq!(format_floats(&[Some(4.0)]), vec!["4.0"]);
        assert_eq!(format_floats(&[Some(1.0 / 3.0)]), vec!["0.333333"]);
    }

    #[test]
    fn test_render_table_alignment() {
        let table = render_table(
            &["0".into(), "1".into()],
            &["a".into(), "name".into()],
            &[vec!["1".into(), "10".into()], vec!["x".into(), "yy".into()]],
        );
        assert_eq!(table, "    a  name\n0   1     x\n1  10    yy");
    }

    #[test]
    fn test_format_memory() {
        assert_eq!(format_memory(248), "248.0 bytes");
        assert_eq!(format_memory(2048), "2.0 KB");
    }

    #[test]
    fn test_null_counts_layout() {
        let df = DataFrame::new(vec![
            Column::new("a", ColumnData::Int(vec![1, 2])),
            Column::new("long", ColumnData::Float(vec![None, None])),
        ])
        .unwrap();
        assert_eq!(null_counts(&df), "a       0\nlong    2");
    }

    #[test]
    fn test_preview_limits_rows() {
        let df = DataFrame::new(vec![Column::new(
            "n",
            ColumnData::Int((0..10).collect()),
        )])
        .unwrap();
        let text = preview(&df);
        assert_eq!(text.lines().count(), PREVIEW_ROWS + 1);
        assert!(text.lines().last().unwrap().starts_with('4'));
    }

    #[test]
    fn test_zero_row_frame() {
        let df = DataFrame::new(vec![
            Column::new("a", ColumnData::Text(Vec::new())),
            Column::new("b", ColumnData::Text(Vec::new())),
        ])
        .unwrap();
        assert_eq!(preview(&df), "Empty DataFrame\nColumns: [a, b]\nIndex: []");
        assert!(info(&df).contains("RangeIndex: 0 entries\n"));
        assert!(info(&df).contains("0 non-null"));
    }

    #[test]
    fn test_info_lists_columns() {
        let df = DataFrame::new(vec![
            Column::new("id", ColumnData::Int(vec![1, 2, 3])),
            Column::new("city", ColumnData::Text(vec![Some("a".into()), None, Some("c".into())])),
        ])
        .unwrap();
        let text = info(&df);
        assert!(text.contains("RangeIndex: 3 entries, 0 to 2"));
        assert!(text.contains("2 non-null"));
        assert!(text.contains("dtypes: int64(1), object(1)"));
        assert!(text.contains("memory usage: 176.0+ bytes"));
    }
}
