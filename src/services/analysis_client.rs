//! Boundary to the remote analysis service
//!
//! Every call returns the raw response body; decoding is left to
//! [`ResultParser`](crate::services::ResultParser) so that the `NaN` fixup and
//! shape checks happen in one place.

use crate::config::ServiceConfig;
use crate::core::{ClientError, ClientResult};
use crate::services::result_parser::ResultParser;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// A file picked for upload. Consumed by the upload request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read a local file into memory
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.csv")
            .to_string();
        Ok(Self { file_name, bytes })
    }
}

/// Body of the bivariate plot request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlotRequest {
    pub column1: String,
    pub column2: String,
}

/// Body shared by the train and fill-missing requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnsRequest {
    pub selected_columns: Vec<String>,
}

/// Operations offered by the analysis service.
///
/// Implementations report transport problems and non-2xx statuses as
/// [`ClientError::NetworkFailure`] and otherwise hand back the body untouched.
#[allow(async_fn_in_trait)]
pub trait AnalysisService {
    /// Create a dataset from a multipart file upload
    async fn upload(&self, file: UploadFile) -> ClientResult<String>;

    /// Fetch the dtype / missing / unique / summary report
    async fn describe(&self) -> ClientResult<String>;

    /// Fetch the trailing rows of the dataset
    async fn tail(&self) -> ClientResult<String>;

    async fn plot(&self, request: &PlotRequest) -> ClientResult<String>;

    async fn train(&self, request: &ColumnsRequest) -> ClientResult<String>;

    async fn fill_missing(&self, request: &ColumnsRequest) -> ClientResult<String>;
}

/// [`AnalysisService`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpAnalysisService {
    http: reqwest::Client,
    config: ServiceConfig,
}

impl HttpAnalysisService {
    pub fn new(config: ServiceConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { http, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Turn a response into its body, mapping non-2xx statuses to a network failure
    async fn finish(response: reqwest::Response) -> ClientResult<String> {
        let status = response.status();
        let body = response.text().await?;
        debug!(%status, bytes = body.len(), "analysis service replied");
        if status.is_success() {
            return Ok(body);
        }
        let detail = ResultParser::error_message(&body).unwrap_or_else(|| {
            let trimmed = body.trim();
            trimmed.chars().take(200).collect()
        });
        Err(ClientError::NetworkFailure(format!("{status}: {detail}")))
    }

    async fn get(&self, path: &str) -> ClientResult<String> {
        let response = self.http.get(self.url(path)).send().await?;
        Self::finish(response).await
    }

    async fn post_json<T: Serialize>(&self, path: &str, body: &T) -> ClientResult<String> {
        let response = self.http.post(self.url(path)).json(body).send().await?;
        Self::finish(response).await
    }
}

impl AnalysisService for HttpAnalysisService {
    async fn upload(&self, file: UploadFile) -> ClientResult<String> {
        let part = Part::bytes(file.bytes).file_name(file.file_name);
        let form = Form::new().part("file", part);
        let response = self
            .http
            .post(self.url(&self.config.endpoints.upload))
            .multipart(form)
            .send()
            .await?;
        Self::finish(response).await
    }

    async fn describe(&self) -> ClientResult<String> {
        self.get(&self.config.endpoints.describe).await
    }

    async fn tail(&self) -> ClientResult<String> {
        self.get(&self.config.endpoints.tail).await
    }

    async fn plot(&self, request: &PlotRequest) -> ClientResult<String> {
        self.post_json(&self.config.endpoints.plot, request).await
    }

    async fn train(&self, request: &ColumnsRequest) -> ClientResult<String> {
        self.post_json(&self.config.endpoints.train, request).await
    }

    async fn fill_missing(&self, request: &ColumnsRequest) -> ClientResult<String> {
        self.post_json(&self.config.endpoints.fillna, request).await
    }
}
