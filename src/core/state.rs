use crate::core::error::{ClientError, ClientResult};
use crate::core::report::DescriptiveReport;
use crate::core::types::{ColumnTitles, DatasetHandle, PreviewRow, SelectedColumns, ViewMode};
use chrono::{DateTime, Local};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use strum::Display;

/// Severity of a user-facing status message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum StatusLevel {
    Info,
    Warn,
    Error,
}

/// Most recent outcome reported to the user
#[derive(Debug, Clone, PartialEq)]
pub struct StatusLine {
    pub level: StatusLevel,
    pub message: String,
    pub at: DateTime<Local>,
}

impl StatusLine {
    pub fn new(level: StatusLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            at: Local::now(),
        }
    }
}

/// Single source of truth for one analysis session.
///
/// Owns the dataset identity, previews, column metadata, the user's selection,
/// the active form and every result fetched from the service. Controllers
/// mutate it only after a response has been fully parsed, so a failed request
/// always leaves the last good values in place.
#[derive(Debug, Clone, Default)]
pub struct WorkflowState {
    dataset: Option<DatasetHandle>,
    /// Head rows returned by the last upload
    fetched_preview: Vec<PreviewRow>,
    /// Rows currently shown in the preview table
    preview: Vec<PreviewRow>,
    column_titles: ColumnTitles,
    selected: SelectedColumns,
    view_mode: ViewMode,
    report: Option<DescriptiveReport>,
    mse: Option<f64>,
    tail_rows: Vec<PreviewRow>,
    status: Option<StatusLine>,
    last_error: Option<ClientError>,
}

impl WorkflowState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dataset(&self) -> Option<&DatasetHandle> {
        self.dataset.as_ref()
    }

    pub fn fetched_preview(&self) -> &[PreviewRow] {
        &self.fetched_preview
    }

    pub fn preview(&self) -> &[PreviewRow] {
        &self.preview
    }

    pub fn column_titles(&self) -> &ColumnTitles {
        &self.column_titles
    }

    pub fn selected(&self) -> &SelectedColumns {
        &self.selected
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn report(&self) -> Option<&DescriptiveReport> {
        self.report.as_ref()
    }

    pub fn mse(&self) -> Option<f64> {
        self.mse
    }

    pub fn tail_rows(&self) -> &[PreviewRow] {
        &self.tail_rows
    }

    pub fn status(&self) -> Option<&StatusLine> {
        self.status.as_ref()
    }

    pub fn last_error(&self) -> Option<&ClientError> {
        self.last_error.as_ref()
    }

    /// The column picker is shown once titles exist and the regression form has not been opened
    pub fn column_picker_visible(&self) -> bool {
        !self.column_titles.is_empty() && self.view_mode == ViewMode::ColumnPicker
    }

    /// Replace the dataset with a freshly uploaded one.
    ///
    /// Titles are recomputed from the first row, the visible preview is cleared
    /// until the user asks for it, and the selection keeps only names that still exist.
    pub fn commit_upload(&mut self, dataset: DatasetHandle, head: Vec<PreviewRow>) {
        self.column_titles = ColumnTitles::from_preview(&head);
        self.selected.retain_titles(&self.column_titles);
        self.fetched_preview = head;
        self.preview.clear();
        self.dataset = Some(dataset);
    }

    /// Copy the uploaded head rows into the visible table. No-op without a preview.
    pub fn show_preview(&mut self) -> bool {
        if self.fetched_preview.is_empty() {
            return false;
        }
        self.preview = self.fetched_preview.clone();
        true
    }

    /// Check or uncheck a column in the picker.
    ///
    /// Names that are not current titles are ignored. Returns whether the selection changed.
    pub fn set_column_checked(&mut self, column: &str, checked: bool) -> bool {
        if !self.column_titles.contains(column) {
            return false;
        }
        if checked {
            self.selected.select(column)
        } else {
            self.selected.deselect(column)
        }
    }

    pub fn toggle_column(&mut self, column: &str) -> bool {
        let checked = !self.selected.contains(column);
        self.set_column_checked(column, checked)
    }

    /// Move from the column picker to the regression form. There is no way back.
    pub fn request_regression_form(&mut self) -> ClientResult<()> {
        if self.view_mode == ViewMode::RegressionForm {
            return Ok(());
        }
        if !self.selected.is_sufficient() {
            return Err(ClientError::InsufficientSelection {
                required: SelectedColumns::MIN_FOR_ANALYSIS,
                selected: self.selected.len(),
            });
        }
        self.view_mode = ViewMode::RegressionForm;
        Ok(())
    }

    pub fn store_report(&mut self, report: DescriptiveReport) {
        self.report = Some(report);
    }

    pub fn store_mse(&mut self, mse: f64) {
        self.mse = Some(mse);
    }

    pub fn store_tail(&mut self, rows: Vec<PreviewRow>) {
        self.tail_rows = rows;
    }

    pub fn report_info(&mut self, message: impl Into<String>) {
        self.status = Some(StatusLine::new(StatusLevel::Info, message));
    }

    pub fn report_warning(&mut self, message: impl Into<String>) {
        self.status = Some(StatusLine::new(StatusLevel::Warn, message));
    }

    /// Record a failure for display; does not touch any fetched data
    pub fn report_error(&mut self, error: &ClientError) {
        self.status = Some(StatusLine::new(StatusLevel::Error, error.to_string()));
        self.last_error = Some(error.clone());
    }
}

/// Session state shared between the UI loop and in-flight requests.
///
/// Handlers only lock it between awaits, so no request ever observes a
/// half-applied update.
pub type SharedState = Arc<Mutex<WorkflowState>>;

pub fn shared_state(state: WorkflowState) -> SharedState {
    Arc::new(Mutex::new(state))
}

/// Lock the session state, recovering the data if a previous holder panicked
pub fn lock_state(state: &SharedState) -> MutexGuard<'_, WorkflowState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::CellValue;

    fn rows(cols: &[&str]) -> Vec<PreviewRow> {
        vec![PreviewRow::new(
            cols.iter()
                .map(|c| (c.to_string(), CellValue::Number(1.into())))
                .collect(),
        )]
    }

    #[test]
    fn test_upload_recomputes_titles_and_hides_preview() {
        let mut state = WorkflowState::new();
        state.commit_upload(DatasetHandle::new("a.csv"), rows(&["x", "y"]));
        assert_eq!(state.column_titles().as_slice(), ["x", "y"]);
        assert!(state.preview().is_empty());
        assert!(state.show_preview());
        assert_eq!(state.preview().len(), 1);
    }

    #[test]
    fn test_empty_upload_clears_titles() {
        let mut state = WorkflowState::new();
        state.commit_upload(DatasetHandle::new("a.csv"), rows(&["x"]));
        state.commit_upload(DatasetHandle::new("b.csv"), Vec::new());
        assert!(state.column_titles().is_empty());
        assert!(!state.column_picker_visible());
        assert!(!state.show_preview());
    }

    #[test]
    fn test_new_upload_prunes_selection() {
        let mut state = WorkflowState::new();
        state.commit_upload(DatasetHandle::new("a.csv"), rows(&["x", "y", "z"]));
        state.toggle_column("z");
        state.toggle_column("x");
        state.commit_upload(DatasetHandle::new("b.csv"), rows(&["x", "w"]));
        assert_eq!(state.selected().as_slice(), ["x"]);
    }

    #[test]
    fn test_toggle_ignores_unknown_columns() {
        let mut state = WorkflowState::new();
        state.commit_upload(DatasetHandle::new("a.csv"), rows(&["x"]));
        assert!(!state.toggle_column("nope"));
        assert!(state.toggle_column("x"));
        assert!(state.toggle_column("x"));
        assert!(state.selected().is_empty());
    }

    #[test]
    fn test_regression_form_is_one_way() {
        let mut state = WorkflowState::new();
        state.commit_upload(DatasetHandle::new("a.csv"), rows(&["x", "y"]));
        state.toggle_column("x");
        assert!(matches!(
            state.request_regression_form(),
            Err(ClientError::InsufficientSelection { required: 2, selected: 1 })
        ));
        assert_eq!(state.view_mode(), ViewMode::ColumnPicker);

        state.toggle_column("y");
        state.request_regression_form().unwrap();
        assert_eq!(state.view_mode(), ViewMode::RegressionForm);
        assert!(!state.column_picker_visible());

        state.commit_upload(DatasetHandle::new("b.csv"), rows(&["x", "y"]));
        assert_eq!(state.view_mode(), ViewMode::RegressionForm);
    }

    #[test]
    fn test_report_error_keeps_data() {
        let mut state = WorkflowState::new();
        state.store_mse(1.25);
        state.report_error(&ClientError::NoFileSelected);
        assert_eq!(state.mse(), Some(1.25));
        assert_eq!(state.last_error(), Some(&ClientError::NoFileSelected));
        assert_eq!(state.status().map(|s| s.level), Some(StatusLevel::Error));
    }
}
