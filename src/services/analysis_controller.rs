use crate::core::{
    ClientError, ClientResult, FillMissingOutcome, SelectedColumns, SharedState, lock_state,
};
use crate::services::analysis_client::{AnalysisService, ColumnsRequest, PlotRequest};
use crate::services::result_parser::ResultParser;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Log and record a controller failure, then hand the result back unchanged.
///
/// Only the status line and last error are written; fetched data keeps its
/// last good value.
pub(crate) fn settle<T>(state: &SharedState, operation: &str, result: ClientResult<T>) -> ClientResult<T> {
    if let Err(err) = &result {
        match err {
            ClientError::NoFileSelected | ClientError::InsufficientSelection { .. } => {
                warn!(operation, "{err}")
            }
            _ => error!(operation, "{err}"),
        }
        lock_state(state).report_error(err);
    }
    result
}

/// Issues the follow-up requests that depend on the uploaded dataset and the
/// user's column selection.
///
/// Each operation is independent and safe to retry. Responses are applied in
/// the order they arrive, so when two requests for the same result overlap
/// the one that completes last wins.
pub struct AnalysisController<S> {
    service: Arc<S>,
    state: SharedState,
}

impl<S> Clone for AnalysisController<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            state: Arc::clone(&self.state),
        }
    }
}

impl<S: AnalysisService> AnalysisController<S> {
    pub fn new(service: Arc<S>, state: SharedState) -> Self {
        Self { service, state }
    }

    /// Show the head rows fetched by the last upload. No request is made.
    pub fn load_preview(&self) -> bool {
        let mut state = lock_state(&self.state);
        let shown = state.show_preview();
        if shown {
            debug!(rows = state.preview().len(), "preview shown");
        } else {
            debug!("no uploaded preview to show");
        }
        shown
    }

    /// Fetch and log the trailing rows. Selection and view mode are untouched.
    pub async fn load_tail(&self) -> ClientResult<usize> {
        let result = self.fetch_tail().await;
        settle(&self.state, "tail", result)
    }

    /// Fetch the descriptive report; replaces the stored one only if it parses
    pub async fn load_descriptive_report(&self) -> ClientResult<()> {
        let result = self.fetch_report().await;
        settle(&self.state, "describe", result)
    }

    /// Ask the service to plot the first two selected columns
    pub async fn plot_pair(&self) -> ClientResult<String> {
        let result = self.request_plot().await;
        settle(&self.state, "plot", result)
    }

    /// Train a regression on the selection: the last column is the target,
    /// every earlier one a feature. Stores the returned MSE.
    pub async fn run_regression(&self) -> ClientResult<f64> {
        let result = self.train().await;
        settle(&self.state, "train", result)
    }

    /// Request mean imputation of nulls in `column`.
    ///
    /// The stored report is not refreshed; call
    /// [`load_descriptive_report`](Self::load_descriptive_report) to see the new counts.
    pub async fn fill_missing(&self, column: &str) -> ClientResult<FillMissingOutcome> {
        let result = self.request_fill(column).await;
        settle(&self.state, "fillna", result)
    }

    async fn fetch_tail(&self) -> ClientResult<usize> {
        let body = self.service.tail().await?;
        let rows = ResultParser::parse_tail(&body)?;
        info!(rows = rows.len(), "tail rows: {rows:?}");
        let count = rows.len();
        let mut state = lock_state(&self.state);
        state.store_tail(rows);
        state.report_info(format!("Loaded {count} tail rows"));
        Ok(count)
    }

    async fn fetch_report(&self) -> ClientResult<()> {
        let body = self.service.describe().await?;
        let report = ResultParser::parse_report(&body)?;
        let columns = report.data_types.len();
        info!(columns, "descriptive report received");
        let mut state = lock_state(&self.state);
        state.store_report(report);
        state.report_info(format!("Descriptive report loaded for {columns} columns"));
        Ok(())
    }

    async fn request_plot(&self) -> ClientResult<String> {
        let request = {
            let state = lock_state(&self.state);
            let selected = state.selected();
            let (column1, column2) = selected
                .leading_pair()
                .ok_or_else(|| insufficient(selected))?;
            PlotRequest {
                column1: column1.to_string(),
                column2: column2.to_string(),
            }
        };
        info!(column1 = %request.column1, column2 = %request.column2, "requesting plot");
        let body = self.service.plot(&request).await?;
        let ack = ResultParser::parse_ack(&body);
        let message = if ack.is_empty() {
            format!("Plotted {} vs {}", request.column1, request.column2)
        } else {
            ack.clone()
        };
        lock_state(&self.state).report_info(message);
        Ok(ack)
    }

    async fn train(&self) -> ClientResult<f64> {
        let request = {
            let state = lock_state(&self.state);
            let selected = state.selected();
            if !selected.is_sufficient() {
                return Err(insufficient(selected));
            }
            debug!(features = ?selected.features(), target = ?selected.target(), "regression columns");
            ColumnsRequest {
                selected_columns: selected.to_vec(),
            }
        };
        let body = self.service.train(&request).await?;
        let mse = ResultParser::parse_mse(&body)?;
        info!(mse, "regression trained");
        let mut state = lock_state(&self.state);
        state.store_mse(mse);
        state.report_info(format!("Linear regression MSE: {mse}"));
        Ok(mse)
    }

    async fn request_fill(&self, column: &str) -> ClientResult<FillMissingOutcome> {
        if column.is_empty() {
            return Err(ClientError::InsufficientSelection {
                required: 1,
                selected: 0,
            });
        }
        let request = ColumnsRequest {
            selected_columns: vec![column.to_string()],
        };
        info!(column, "requesting null fill");
        let body = self.service.fill_missing(&request).await?;
        let outcome = ResultParser::parse_fill_outcome(&body);
        info!(column, mean_values = ?outcome.mean_values, "null values filled");
        lock_state(&self.state).report_info(format!(
            "Filled null values in {column}; refresh the report to see updated counts"
        ));
        Ok(outcome)
    }

    /// Switch from the column picker to the regression form
    pub fn request_regression_form(&self) -> ClientResult<()> {
        let result = lock_state(&self.state).request_regression_form();
        settle(&self.state, "regression form", result)
    }
}

fn insufficient(selected: &SelectedColumns) -> ClientError {
    ClientError::InsufficientSelection {
        required: SelectedColumns::MIN_FOR_ANALYSIS,
        selected: selected.len(),
    }
}
