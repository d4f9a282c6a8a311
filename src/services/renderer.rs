//! Projection of session state into plain, drawable structures
//!
//! Nothing here has side effects or caches anything: every call re-derives the
//! whole model from the current [`WorkflowState`].

use crate::core::{
    CellValue, ColumnTitles, DescriptiveReport, PreviewRow, STATISTIC_NAMES, SelectedColumns,
    StatusLine, UniqueSummary, ViewMode, WorkflowState,
};

/// Placeholder for a statistic that is absent or could not be decoded
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCell {
    pub label: String,
    /// The first column is drawn distinctly
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    pub headers: Vec<HeaderCell>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistItem {
    pub label: String,
    pub checked: bool,
    /// Read-only entries cannot be toggled
    pub locked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnChecklist {
    pub items: Vec<ChecklistItem>,
    /// Whether the plot submission is enabled
    pub can_submit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegressionFormView {
    pub features: Vec<ChecklistItem>,
    pub target: Option<ChecklistItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTypeRow {
    pub column: String,
    pub dtype: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingValueRow {
    pub column: String,
    pub dtype: Option<String>,
    pub missing: u64,
    /// Offer the "remove nulls" action for this column
    pub remove_nulls: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UniqueCell {
    Scalar(String),
    List(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueValueRow {
    pub column: String,
    pub value: UniqueCell,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatisticRow {
    pub statistic: String,
    pub values: Vec<String>,
}

/// Summary statistics pivoted: one row per statistic, one value per column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatisticsTable {
    pub columns: Vec<String>,
    pub rows: Vec<StatisticRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportView {
    pub overview: Option<String>,
    pub data_types: Vec<DataTypeRow>,
    pub missing_values: Vec<MissingValueRow>,
    pub unique_values: Vec<UniqueValueRow>,
    pub statistics: StatisticsTable,
}

/// Everything the front end needs to draw one frame
#[derive(Debug, Clone, PartialEq)]
pub struct RenderModel {
    pub dataset: Option<String>,
    pub preview: Option<TableView>,
    pub tail: Option<TableView>,
    pub column_picker: Option<ColumnChecklist>,
    pub regression_form: Option<RegressionFormView>,
    pub mse: Option<f64>,
    pub report: Option<ReportView>,
    pub status: Option<StatusLine>,
}

pub struct ResultRenderer;

impl ResultRenderer {
    pub fn render(state: &WorkflowState) -> RenderModel {
        let column_picker = state
            .column_picker_visible()
            .then(|| Self::column_picker(state.column_titles(), state.selected()));
        let regression_form = (state.view_mode() == ViewMode::RegressionForm)
            .then(|| Self::regression_form(state.selected()));

        RenderModel {
            dataset: state.dataset().map(|d| d.name.clone()),
            preview: Self::table(state.preview()),
            tail: Self::table(state.tail_rows()),
            column_picker,
            regression_form,
            mse: state.mse(),
            report: state.report().map(Self::report),
            status: state.status().cloned(),
        }
    }

    /// Rows as a table whose columns follow the first row; `None` when empty
    pub fn table(rows: &[PreviewRow]) -> Option<TableView> {
        let titles = ColumnTitles::from_preview(rows);
        if titles.is_empty() {
            return None;
        }
        let headers = titles
            .iter()
            .enumerate()
            .map(|(idx, title)| HeaderCell {
                label: title.clone(),
                highlighted: idx == 0,
            })
            .collect();
        let rows = rows
            .iter()
            .map(|row| {
                titles
                    .iter()
                    .map(|title| row.get(title).map(CellValue::to_string).unwrap_or_default())
                    .collect()
            })
            .collect();
        Some(TableView { headers, rows })
    }

    pub fn column_picker(titles: &ColumnTitles, selected: &SelectedColumns) -> ColumnChecklist {
        ColumnChecklist {
            items: titles
                .iter()
                .map(|title| ChecklistItem {
                    label: title.clone(),
                    checked: selected.contains(title),
                    locked: false,
                })
                .collect(),
            can_submit: selected.is_sufficient(),
        }
    }

    pub fn regression_form(selected: &SelectedColumns) -> RegressionFormView {
        let locked = |label: &str| ChecklistItem {
            label: label.to_string(),
            checked: true,
            locked: true,
        };
        RegressionFormView {
            features: selected.features().iter().map(|c| locked(c)).collect(),
            target: selected.target().map(locked),
        }
    }

    pub fn report(report: &DescriptiveReport) -> ReportView {
        let overview = report.shape.map(|(rows, cols)| {
            let memory = report.total_memory();
            if memory > 0 {
                format!("{rows} rows x {cols} columns, {memory} bytes in memory")
            } else {
                format!("{rows} rows x {cols} columns")
            }
        });

        let data_types = report
            .data_types
            .iter()
            .map(|(column, dtype)| DataTypeRow {
                column: column.to_string(),
                dtype: dtype.to_string(),
            })
            .collect();

        let missing_values = report
            .missing_values
            .iter()
            .map(|(column, missing)| MissingValueRow {
                column: column.to_string(),
                dtype: report.dtype(column).map(ToString::to_string),
                missing: *missing,
                remove_nulls: report.can_fill_missing(column),
            })
            .collect();

        let unique_values = report
            .unique_values
            .iter()
            .map(|(column, summary)| UniqueValueRow {
                column: column.to_string(),
                value: match summary {
                    UniqueSummary::Scalar(value) => UniqueCell::Scalar(value.to_string()),
                    UniqueSummary::List(values) => {
                        UniqueCell::List(values.iter().map(ToString::to_string).collect())
                    }
                },
            })
            .collect();

        ReportView {
            overview,
            data_types,
            missing_values,
            unique_values,
            statistics: Self::statistics(report),
        }
    }

    fn statistics(report: &DescriptiveReport) -> StatisticsTable {
        let columns: Vec<String> = report.summary_statistics.columns().map(str::to_string).collect();
        let rows = STATISTIC_NAMES
            .iter()
            .map(|name| StatisticRow {
                statistic: name.to_string(),
                values: report
                    .summary_statistics
                    .iter()
                    .map(|(_, stats)| match stats {
                        Ok(stats) => stats
                            .get(name)
                            .map(|v| v.to_string())
                            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                        Err(_) => NOT_AVAILABLE.to_string(),
                    })
                    .collect(),
            })
            .collect();
        StatisticsTable { columns, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DType, DatasetHandle, ParseError, SummaryStats};
    use crate::services::ResultParser;
    use pretty_assertions::assert_eq;

    fn row(cells: &[(&str, CellValue)]) -> PreviewRow {
        PreviewRow::new(cells.iter().map(|(k, v)| (k.to_string(), v.clone())).collect())
    }

    fn state_with_columns(cols: &[&str]) -> WorkflowState {
        let mut state = WorkflowState::new();
        let cells: Vec<(&str, CellValue)> = cols.iter().map(|c| (*c, CellValue::Number(1.into()))).collect();
        state.commit_upload(DatasetHandle::new("d.csv"), vec![row(&cells)]);
        state
    }

    #[test]
    fn test_empty_state_renders_nothing() {
        let model = ResultRenderer::render(&WorkflowState::new());
        assert!(model.preview.is_none());
        assert!(model.column_picker.is_none());
        assert!(model.regression_form.is_none());
        assert!(model.report.is_none());
        assert!(model.mse.is_none());
    }

    #[test]
    fn test_preview_table_highlights_first_column() {
        let mut state = WorkflowState::new();
        state.commit_upload(
            DatasetHandle::new("d.csv"),
            vec![
                row(&[("id", CellValue::Number(1.into())), ("name", CellValue::Text("a".into()))]),
                row(&[("id", CellValue::Number(2.into())), ("name", CellValue::Null)]),
            ],
        );
        assert!(ResultRenderer::render(&state).preview.is_none());
        state.show_preview();

        let table = ResultRenderer::render(&state).preview.unwrap();
        assert_eq!(
            table.headers,
            vec![
                HeaderCell { label: "id".into(), highlighted: true },
                HeaderCell { label: "name".into(), highlighted: false },
            ]
        );
        assert_eq!(table.rows, vec![vec!["1".to_string(), "a".to_string()], vec!["2".to_string(), String::new()]]);
    }

    #[test]
    fn test_checklist_reflects_selection() {
        let mut state = state_with_columns(&["a", "b", "c"]);
        state.toggle_column("b");
        let picker = ResultRenderer::render(&state).column_picker.unwrap();
        let checked: Vec<bool> = picker.items.iter().map(|i| i.checked).collect();
        assert_eq!(checked, vec![false, true, false]);
        assert!(!picker.can_submit);

        state.toggle_column("a");
        assert!(ResultRenderer::render(&state).column_picker.unwrap().can_submit);
    }

    #[test]
    fn test_regression_form_replaces_picker() {
        let mut state = state_with_columns(&["a", "b", "c"]);
        state.toggle_column("c");
        state.toggle_column("a");
        state.toggle_column("b");
        state.request_regression_form().unwrap();

        let model = ResultRenderer::render(&state);
        assert!(model.column_picker.is_none());
        let form = model.regression_form.unwrap();
        let features: Vec<&str> = form.features.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(features, vec!["c", "a"]);
        assert!(form.features.iter().all(|f| f.checked && f.locked));
        let target = form.target.unwrap();
        assert_eq!(target.label, "b");
        assert!(target.checked && target.locked);
    }

    #[test]
    fn test_partial_statistics_render_na() {
        let mut report = DescriptiveReport::default();
        report.summary_statistics.insert(
            "a",
            ResultParser::decode_statistics("a", "{'count': 5, 'mean': 2.0}"),
        );
        let view = ResultRenderer::report(&report);
        let values: Vec<(String, String)> = view
            .statistics
            .rows
            .iter()
            .map(|r| (r.statistic.clone(), r.values[0].clone()))
            .collect();
        assert_eq!(
            values,
            vec![
                ("count".to_string(), "5".to_string()),
                ("mean".to_string(), "2".to_string()),
                ("std".to_string(), "N/A".to_string()),
                ("min".to_string(), "N/A".to_string()),
                ("25%".to_string(), "N/A".to_string()),
                ("50%".to_string(), "N/A".to_string()),
                ("75%".to_string(), "N/A".to_string()),
                ("max".to_string(), "N/A".to_string()),
            ]
        );
    }

    #[test]
    fn test_bad_column_does_not_affect_others() {
        let mut report = DescriptiveReport::default();
        report.summary_statistics.insert(
            "a",
            Ok(SummaryStats {
                count: Some(10.0),
                max: Some(9.5),
                ..SummaryStats::default()
            }),
        );
        report.summary_statistics.insert(
            "b",
            Err(ParseError::Column {
                column: "b".into(),
                reason: "bad".into(),
            }),
        );
        report.summary_statistics.insert(
            "c",
            Ok(SummaryStats {
                count: Some(3.0),
                ..SummaryStats::default()
            }),
        );

        let table = ResultRenderer::report(&report).statistics;
        assert_eq!(table.columns, vec!["a", "b", "c"]);
        assert_eq!(table.rows[0].values, vec!["10", "N/A", "3"]);
        assert_eq!(table.rows[7].values, vec!["9.5", "N/A", "N/A"]);
    }

    #[test]
    fn test_remove_nulls_offer_rules() {
        let mut report = DescriptiveReport::default();
        for (column, dtype, missing) in [
            ("obj", "object", 3),
            ("clean", "float64", 0),
            ("f", "float64", 2),
            ("i", "int64", 1),
        ] {
            report.data_types.insert(column, DType::from_tag(dtype));
            report.missing_values.insert(column, missing);
        }
        report.missing_values.insert("untyped", 4);

        let offers: Vec<(String, bool)> = ResultRenderer::report(&report)
            .missing_values
            .into_iter()
            .map(|r| (r.column, r.remove_nulls))
            .collect();
        assert_eq!(
            offers,
            vec![
                ("obj".to_string(), false),
                ("clean".to_string(), false),
                ("f".to_string(), true),
                ("i".to_string(), true),
                ("untyped".to_string(), false),
            ]
        );
    }

    #[test]
    fn test_unique_values_keep_variant() {
        let mut report = DescriptiveReport::default();
        report
            .unique_values
            .insert("n", UniqueSummary::Scalar(CellValue::Number(7.into())));
        report.unique_values.insert(
            "c",
            UniqueSummary::List(vec![CellValue::Text("x".into()), CellValue::Text("y".into())]),
        );
        let rows = ResultRenderer::report(&report).unique_values;
        assert_eq!(rows[0].value, UniqueCell::Scalar("7".into()));
        assert_eq!(rows[1].value, UniqueCell::List(vec!["x".into(), "y".into()]));
    }

    #[test]
    fn test_overview_line() {
        let mut report = DescriptiveReport::default();
        report.shape = Some((150, 5));
        report.memory_usage.insert("a", 1200);
        assert_eq!(
            ResultRenderer::report(&report).overview.as_deref(),
            Some("150 rows x 5 columns, 1200 bytes in memory")
        );
    }
}
