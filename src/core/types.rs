use derive_deref::Deref;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::Display;
use uuid::Uuid;

/// Client-side identifier for an uploaded dataset
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetId(Uuid);

impl DatasetId {
    /// Create a new unique dataset ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for DatasetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DatasetId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s).map_err(|e| e.to_string())?))
    }
}

/// Opaque handle to a dataset that lives on the analysis service.
///
/// The client never keeps the uploaded bytes; it only remembers which upload
/// the current state belongs to and the name the service stored it under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetHandle {
    pub id: DatasetId,
    pub name: String,
}

impl DatasetHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: DatasetId::new(),
            name: name.into(),
        }
    }
}

/// A scalar cell as delivered by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// One row of a head/tail preview, keeping the service's column order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreviewRow {
    cells: Vec<(String, CellValue)>,
}

impl PreviewRow {
    pub fn new(cells: Vec<(String, CellValue)>) -> Self {
        Self { cells }
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &CellValue> {
        self.cells.iter().map(|(_, value)| value)
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Distinct column names in first-seen order, derived from a preview's first row
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, Serialize, Deserialize)]
pub struct ColumnTitles(Vec<String>);

impl ColumnTitles {
    /// Titles of the first row; empty when the preview has no rows
    pub fn from_preview(rows: &[PreviewRow]) -> Self {
        let mut titles: Vec<String> = Vec::new();
        if let Some(first) = rows.first() {
            for name in first.columns() {
                if !titles.iter().any(|t| t == name) {
                    titles.push(name.to_string());
                }
            }
        }
        Self(titles)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|t| t == name)
    }
}

/// User-chosen columns in the order they were checked.
///
/// Order carries meaning: for regression every entry but the last is a
/// feature and the last is the target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, Serialize, Deserialize)]
pub struct SelectedColumns(Vec<String>);

impl SelectedColumns {
    /// Minimum number of selected columns for plot and regression requests
    pub const MIN_FOR_ANALYSIS: usize = 2;

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|c| c == name)
    }

    /// Append `name` if absent. Returns whether the selection changed.
    pub fn select(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.0.push(name.to_string());
        true
    }

    /// Remove `name`, keeping the relative order of the rest
    pub fn deselect(&mut self, name: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|c| c != name);
        before != self.0.len()
    }

    /// Drop any entry that is not one of `titles`
    pub fn retain_titles(&mut self, titles: &ColumnTitles) {
        self.0.retain(|c| titles.contains(c));
    }

    pub fn is_sufficient(&self) -> bool {
        self.0.len() >= Self::MIN_FOR_ANALYSIS
    }

    /// First two selections, the pair sent for bivariate plotting
    pub fn leading_pair(&self) -> Option<(&str, &str)> {
        match self.0.as_slice() {
            [first, second, ..] => Some((first.as_str(), second.as_str())),
            _ => None,
        }
    }

    /// Every entry except the last
    pub fn features(&self) -> &[String] {
        match self.0.split_last() {
            Some((_, features)) => features,
            None => &[],
        }
    }

    /// The last entry
    pub fn target(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.clone()
    }
}

impl<S: Into<String>> FromIterator<S> for SelectedColumns {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut selected = SelectedColumns::default();
        for name in iter {
            let name = name.into();
            selected.select(&name);
        }
        selected
    }
}

/// Which of the two mutually exclusive forms is on screen
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum ViewMode {
    #[default]
    ColumnPicker,
    RegressionForm,
}

/// Broad family of a pandas-style dtype tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum DTypeFamily {
    Integer,
    Float,
    Object,
    Boolean,
    Datetime,
    Categorical,
    Other,
}

/// Column data type as reported by the service, keeping its original tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DType {
    pub tag: String,
    pub family: DTypeFamily,
}

impl DType {
    pub fn from_tag(tag: &str) -> Self {
        let lower = tag.trim().to_ascii_lowercase();
        let family = if is_integer_tag(&lower) {
            DTypeFamily::Integer
        } else if lower.starts_with("float") {
            DTypeFamily::Float
        } else if lower == "object" || lower == "string" || lower == "str" {
            DTypeFamily::Object
        } else if lower.starts_with("bool") {
            DTypeFamily::Boolean
        } else if lower.starts_with("datetime") || lower.starts_with("timedelta") {
            DTypeFamily::Datetime
        } else if lower == "category" {
            DTypeFamily::Categorical
        } else {
            DTypeFamily::Other
        };
        Self {
            tag: tag.to_string(),
            family,
        }
    }

    /// Integer or float family
    pub fn is_numeric(&self) -> bool {
        matches!(self.family, DTypeFamily::Integer | DTypeFamily::Float)
    }
}

/// `int`, `uint`, `int64`, `UInt8` and the like; not `interval[...]`
fn is_integer_tag(lower: &str) -> bool {
    let Some(rest) = lower.strip_prefix("uint").or_else(|| lower.strip_prefix("int")) else {
        return false;
    };
    rest.chars().all(|c| c.is_ascii_digit())
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag)
    }
}
