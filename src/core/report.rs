use crate::core::error::ParseError;
use crate::core::types::{CellValue, DType};
use serde::{Deserialize, Serialize};

/// Canonical summary statistic names, in display order
pub const STATISTIC_NAMES: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

/// Column-keyed values in the order the service listed them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMap<T>(Vec<(String, T)>);

impl<T> Default for ColumnMap<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> ColumnMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the value for `column`, keeping first-seen position
    pub fn insert(&mut self, column: impl Into<String>, value: T) {
        let column = column.into();
        match self.0.iter_mut().find(|(name, _)| *name == column) {
            Some(slot) => slot.1 = value,
            None => self.0.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&T> {
        self.0
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>, T> FromIterator<(S, T)> for ColumnMap<T> {
    fn from_iter<I: IntoIterator<Item = (S, T)>>(iter: I) -> Self {
        let mut map = ColumnMap::new();
        for (column, value) in iter {
            map.insert(column, value);
        }
        map
    }
}

/// Unique-value entry: either a bare scalar (usually a count) or the distinct values themselves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UniqueSummary {
    Scalar(CellValue),
    List(Vec<CellValue>),
}

/// The eight recognised describe() statistics for one column.
///
/// A field is `None` when the service omitted it or sent null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub count: Option<f64>,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub p25: Option<f64>,
    pub p50: Option<f64>,
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

impl SummaryStats {
    /// Look up a statistic by its canonical name (see [`STATISTIC_NAMES`])
    pub fn get(&self, name: &str) -> Option<f64> {
        match name {
            "count" => self.count,
            "mean" => self.mean,
            "std" => self.std,
            "min" => self.min,
            "25%" => self.p25,
            "50%" => self.p50,
            "75%" => self.p75,
            "max" => self.max,
            _ => None,
        }
    }

    pub(crate) fn set(&mut self, name: &str, value: Option<f64>) -> bool {
        let slot = match name {
            "count" => &mut self.count,
            "mean" => &mut self.mean,
            "std" => &mut self.std,
            "min" => &mut self.min,
            "25%" => &mut self.p25,
            "50%" => &mut self.p50,
            "75%" => &mut self.p75,
            "max" => &mut self.max,
            _ => return false,
        };
        *slot = value;
        true
    }
}

/// Decoded statistics for one column, or the reason they could not be decoded
pub type ColumnStatistics = Result<SummaryStats, ParseError>;

/// The dtype / missing / unique / summary bundle for the current dataset.
///
/// The four maps are independent: unique values and summary statistics may
/// omit columns that the other maps list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptiveReport {
    pub data_types: ColumnMap<DType>,
    pub missing_values: ColumnMap<u64>,
    pub unique_values: ColumnMap<UniqueSummary>,
    pub summary_statistics: ColumnMap<ColumnStatistics>,
    pub memory_usage: ColumnMap<u64>,
    pub shape: Option<(u64, u64)>,
}

impl DescriptiveReport {
    pub fn dtype(&self, column: &str) -> Option<&DType> {
        self.data_types.get(column)
    }

    pub fn missing(&self, column: &str) -> Option<u64> {
        self.missing_values.get(column).copied()
    }

    /// Whether null imputation may be offered for `column`: numeric dtype and at least one missing value
    pub fn can_fill_missing(&self, column: &str) -> bool {
        let numeric = self.dtype(column).is_some_and(DType::is_numeric);
        numeric && self.missing(column).is_some_and(|n| n > 0)
    }

    pub fn total_memory(&self) -> u64 {
        self.memory_usage.iter().map(|(_, bytes)| *bytes).sum()
    }
}

/// Service reply to a null-imputation request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FillMissingOutcome {
    pub mean_values: ColumnMap<Option<f64>>,
    pub remaining_nulls: ColumnMap<u64>,
    pub updated_rows: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_map_keeps_first_seen_order() {
        let mut map = ColumnMap::new();
        map.insert("b", 1);
        map.insert("a", 2);
        map.insert("b", 3);
        let pairs: Vec<_> = map.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        assert_eq!(pairs, vec![("b".to_string(), 3), ("a".to_string(), 2)]);
    }

    #[test]
    fn test_summary_stats_lookup_by_name() {
        let mut stats = SummaryStats::default();
        assert!(stats.set("25%", Some(1.5)));
        assert!(!stats.set("median", Some(2.0)));
        assert_eq!(stats.get("25%"), Some(1.5));
        assert_eq!(stats.get("max"), None);
    }

    #[test]
    fn test_can_fill_missing_requires_numeric_and_nulls() {
        let mut report = DescriptiveReport::default();
        report.data_types.insert("age", DType::from_tag("float64"));
        report.data_types.insert("name", DType::from_tag("object"));
        report.data_types.insert("id", DType::from_tag("int64"));
        report.missing_values.insert("age", 4);
        report.missing_values.insert("name", 3);
        report.missing_values.insert("id", 0);

        assert!(report.can_fill_missing("age"));
        assert!(!report.can_fill_missing("name"));
        assert!(!report.can_fill_missing("id"));
        assert!(!report.can_fill_missing("unknown"));
    }
}
