use crate::core::{ClientError, ClientResult, DatasetHandle, SharedState, lock_state};
use crate::services::analysis_client::{AnalysisService, UploadFile};
use crate::services::analysis_controller::settle;
use crate::services::result_parser::ResultParser;
use std::sync::Arc;
use tracing::{info, warn};

/// Submits datasets to the service and loads the result into the session.
///
/// An upload is all-or-nothing: state is only touched after the whole
/// response has been parsed.
pub struct UploadController<S> {
    service: Arc<S>,
    state: SharedState,
}

impl<S> Clone for UploadController<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            state: Arc::clone(&self.state),
        }
    }
}

impl<S: AnalysisService> UploadController<S> {
    pub fn new(service: Arc<S>, state: SharedState) -> Self {
        Self { service, state }
    }

    /// Upload `file` and make it the current dataset.
    ///
    /// With no file this reports [`ClientError::NoFileSelected`] without
    /// contacting the service.
    pub async fn submit(&self, file: Option<UploadFile>) -> ClientResult<DatasetHandle> {
        let Some(file) = file else {
            warn!("upload requested with no file selected");
            return settle(&self.state, "upload", Err(ClientError::NoFileSelected));
        };

        let local_name = file.file_name.clone();
        info!(file = %local_name, bytes = file.bytes.len(), "uploading dataset");
        let result = self.upload(file, &local_name).await;
        settle(&self.state, "upload", result)
    }

    async fn upload(&self, file: UploadFile, local_name: &str) -> ClientResult<DatasetHandle> {
        let body = self.service.upload(file).await?;
        let response = ResultParser::parse_upload(&body)?;

        let handle = DatasetHandle::new(response.filename.as_deref().unwrap_or(local_name));
        let rows = response.head.len();
        info!(dataset = %handle.name, rows, "upload accepted");

        let mut state = lock_state(&self.state);
        state.commit_upload(handle.clone(), response.head);
        let columns = state.column_titles().len();
        let message = response
            .message
            .unwrap_or_else(|| "File uploaded successfully".to_string());
        state.report_info(format!(
            "{message}: {} ({rows} preview rows, {columns} columns)",
            handle.name
        ));
        Ok(handle)
    }
}
