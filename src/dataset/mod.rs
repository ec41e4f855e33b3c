//! Dataset analysis
//!
//! Turns raw CSV text into a descriptive report: schema info, statistics,
//! null counts, a preview and an IQR outlier summary. Analysis never fails;
//! every failure becomes text in the result.

pub mod format;
pub mod frame;
pub mod stats;

use std::fmt;

use crate::error::AnalysisError;
use frame::DataFrame;
use stats::{Description, OutlierReport};

/// Section headers, in report order
pub mod headers {
    pub const INFO: &str = "GENERAL INFORMATION:";
    pub const STATISTICS: &str = "DESCRIPTIVE STATISTICS:";
    pub const NULLS: &str = "NULL VALUES PER COLUMN:";
    pub const PREVIEW: &str = "PREVIEW (first 5 rows):";
    pub const OUTLIERS: &str = "OUTLIER ANALYSIS (IQR):";
}

/// A report whose sections were computed independently
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub info: String,
    pub statistics: Result<String, AnalysisError>,
    pub null_counts: String,
    pub preview: String,
    pub outliers: OutlierReport,
}

impl Report {
    /// Compute every section for a parsed frame
    pub fn build(df: &DataFrame) -> Self {
        Self {
            info: format::info(df),
            statistics: Description::for_frame(df).map(|d| format::description(&d)),
            null_counts: format::null_counts(df),
            preview: format::preview(df),
            outliers: OutlierReport::for_frame(df),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let statistics = match &self.statistics {
            Ok(text) => text.clone(),
            Err(e) => e.to_string(),
        };

        write!(
            f,
            "{}\n{}\n\n{}\n{}\n\n{}\n{}\n\n{}\n{}\n\n{}{}",
            headers::INFO,
            self.info,
            headers::STATISTICS,
            statistics,
            headers::NULLS,
            self.null_counts,
            headers::PREVIEW,
            self.preview,
            headers::OUTLIERS,
            format::outliers(&self.outliers),
        )
    }
}

/// Outcome of analyzing a dataset
#[derive(Debug, Clone, PartialEq)]
pub enum Analysis {
    /// The data parsed; individual sections may still carry failures
    Report(Report),

    /// Nothing could be analyzed
    Failed(AnalysisError),
}

impl Analysis {
    pub fn is_report(&self) -> bool {
        matches!(self, Analysis::Report(_))
    }

    pub fn report(&self) -> Option<&Report> {
        match self {
            Analysis::Report(r) => Some(r),
            Analysis::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&AnalysisError> {
        match self {
            Analysis::Report(_) => None,
            Analysis::Failed(e) => Some(e),
        }
    }
}

impl fmt::Display for Analysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Analysis::Report(report) => fmt::Display::fmt(report, f),
            Analysis::Failed(err) => fmt::Display::fmt(err, f),
        }
    }
}

/// Analyze CSV text
pub fn analyze(csv_data: &str) -> Analysis {
    match DataFrame::from_csv(csv_data) {
        Ok(df) => {
            tracing::debug!(
                rows = df.row_count(),
                columns = df.columns().len(),
                "Parsed dataset"
            );
            Analysis::Report(Report::build(&df))
        }
        Err(e) => {
            tracing::info!("Dataset could not be loaded: {}", e);
            Analysis::Failed(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUSING: &str = "price,area,city\n\
                           100,50,Rome\n\
                           120,55,Milan\n\
                           110,52,Rome\n\
                           105,,Turin\n\
                           5000,60,Rome\n\
                           115,58,Milan\n";

    #[test]
    fn test_empty_input_message() {
        let analysis = analyze("");
        assert!(!analysis.is_report());
        assert_eq!(
            analysis.to_string(),
            "The provided dataset is empty or contains no valid data."
        );
    }

    #[test]
    fn test_parse_error_message() {
        let analysis = analyze("a,b\n1,2\n1,2,3\n");
        assert_eq!(
            analysis.failure(),
            Some(&AnalysisError::Parse("Expected 2 fields in line 3, saw 3".to_string()))
        );
        assert!(analysis.to_string().starts_with("CSV parsing error: Expected 2 fields"));
    }

    #[test]
    fn test_unterminated_quote_message() {
        let analysis = analyze("a,b\n1,\"x\n2,3\n");
        assert!(!analysis.is_report());
        assert_eq!(
            analysis.to_string(),
            "CSV parsing error: EOF inside string starting at row 1"
        );
    }

    #[test]
    fn test_header_only_report() {
        let analysis = analyze("a,b\n");
        assert!(analysis.is_report());

        let text = analysis.to_string();
        let positions: Vec<usize> = [
            headers::INFO,
            headers::STATISTICS,
            headers::NULLS,
            headers::PREVIEW,
            headers::OUTLIERS,
        ]
        .iter()
        .map(|h| text.find(h).expect("missing section header"))
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        assert!(text.contains("RangeIndex: 0 entries"));
        assert!(text.contains("Columns: [a, b]"));
        assert!(text.ends_with("No numeric columns found for IQR analysis."));
    }

    #[test]
    fn test_section_order() {
        let text = analyze(HOUSING).to_string();
        let positions: Vec<usize> = [
            headers::INFO,
            headers::STATISTICS,
            headers::NULLS,
            headers::PREVIEW,
            headers::OUTLIERS,
        ]
        .iter()
        .map(|h| text.find(h).expect("missing section header"))
        .collect();

        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_report_contents() {
        let analysis = analyze(HOUSING);
        let report = analysis.report().unwrap();

        assert_eq!(report.outliers.count_for("price"), Some(1));
        assert_eq!(report.outliers.count_for("area"), Some(0));
        assert!(report
            .null_counts
            .lines()
            .any(|l| l.split_whitespace().eq(["area", "1"])));
        assert!(report.statistics.as_ref().unwrap().contains("top"));

        let text = analysis.to_string();
        assert!(text.contains("Column 'price': 1 outliers found (IQR)"));
        assert!(text.contains("Column 'area': no outliers detected (IQR)"));
    }

    #[test]
    fn test_all_null_column() {
        let analysis = analyze("a,b\n1,\n2,\n3,\n");
        let report = analysis.report().unwrap();

        assert!(report.null_counts.contains("b    3"));
        assert!(analysis.to_string().contains("Column 'b': only null values."));
    }

    #[test]
    fn test_no_numeric_columns() {
        let text = analyze("name\nalice\nbob\n").to_string();
        assert!(text.ends_with("OUTLIER ANALYSIS (IQR):\nNo numeric columns found for IQR analysis."));
    }

    #[test]
    fn test_statistics_failure_keeps_other_sections() {
        let report = Report::build(&DataFrame::default());
        let text = report.to_string();

        assert!(report.statistics.is_err());
        assert!(text.contains("Unable to compute descriptive statistics: Cannot describe a DataFrame without columns"));
        assert!(text.contains(headers::PREVIEW));
        assert!(text.contains(headers::OUTLIERS));
    }
}
