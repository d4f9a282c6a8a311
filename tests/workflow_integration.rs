//! Integration tests driving the controllers against a scripted service

use pretty_assertions::assert_eq;
use statlens::core::{
    CellValue, ClientError, ClientResult, SharedState, ViewMode, WorkflowState, lock_state, shared_state,
};
use statlens::services::renderer::{NOT_AVAILABLE, UniqueCell};
use statlens::services::{
    AnalysisController, AnalysisService, ColumnsRequest, PlotRequest, ResultRenderer, UploadController,
    UploadFile,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

const UPLOAD_OK: &str = r#"{
    "message": "File uploaded successfully",
    "filename": "sales.csv",
    "head": [
        {"region": "north", "units": 10, "price": 2.5, "discount": NaN, "returns": 0},
        {"region": "south", "units": NaN, "price": 3.0, "discount": 0.1, "returns": 1}
    ]
}"#;

const REPORT: &str = r#"{
    "message": "ok",
    "data": {
        "data_types": {"region": "object", "units": "float64", "price": "float64", "returns": "int64"},
        "missing_values": {"region": 2, "units": 1, "price": 0, "returns": 3},
        "unique_values": {"region": ["north", "south"], "units": 7, "price": 9, "returns": 2},
        "summary_statistics": {
            "units": "{'count': 9.0, 'mean': 11.5, 'std': nan, 'min': 1.0, '25%': 4.0, '50%': 10.0, '75%': 15.0, 'max': 30.0}",
            "price": "{'count': 10.0, 'mean': oops",
            "returns": "{'count': 7.0, 'mean': 0.5, 'std': 0.5, 'min': 0.0, '25%': 0.0, '50%': 1.0, '75%': 1.0, 'max': 1.0}"
        },
        "shape": [10, 5]
    }
}"#;

fn report_for(column: &str) -> String {
    format!(
        r#"{{"data": {{"data_types": {{"{column}": "int64"}}, "missing_values": {{"{column}": 0}},
        "unique_values": {{"{column}": 1}}, "summary_statistics": {{}}}}}}"#
    )
}

struct Scripted {
    gate: Option<oneshot::Receiver<()>>,
    body: ClientResult<String>,
}

/// Service double: counts calls, records requests and replays scripted bodies
#[derive(Default)]
struct FakeService {
    scripts: Mutex<HashMap<&'static str, VecDeque<Scripted>>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    plots: Mutex<Vec<PlotRequest>>,
    trains: Mutex<Vec<ColumnsRequest>>,
    fills: Mutex<Vec<ColumnsRequest>>,
}

impl FakeService {
    fn script(&self, endpoint: &'static str, body: ClientResult<&str>) {
        self.script_gated(endpoint, None, body);
    }

    fn script_gated(&self, endpoint: &'static str, gate: Option<oneshot::Receiver<()>>, body: ClientResult<&str>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(endpoint)
            .or_default()
            .push_back(Scripted {
                gate,
                body: body.map(str::to_string),
            });
    }

    fn calls(&self, endpoint: &str) -> usize {
        self.calls.lock().unwrap().get(endpoint).copied().unwrap_or(0)
    }

    fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    async fn reply(&self, endpoint: &'static str) -> ClientResult<String> {
        *self.calls.lock().unwrap().entry(endpoint).or_default() += 1;
        let next = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(endpoint)
            .and_then(VecDeque::pop_front);
        let Some(scripted) = next else {
            return Err(ClientError::NetworkFailure(format!("nothing scripted for {endpoint}")));
        };
        if let Some(gate) = scripted.gate {
            let _ = gate.await;
        }
        scripted.body
    }
}

impl AnalysisService for FakeService {
    async fn upload(&self, _file: UploadFile) -> ClientResult<String> {
        self.reply("upload").await
    }

    async fn describe(&self) -> ClientResult<String> {
        self.reply("describe").await
    }

    async fn tail(&self) -> ClientResult<String> {
        self.reply("tail").await
    }

    async fn plot(&self, request: &PlotRequest) -> ClientResult<String> {
        self.plots.lock().unwrap().push(request.clone());
        self.reply("plot").await
    }

    async fn train(&self, request: &ColumnsRequest) -> ClientResult<String> {
        self.trains.lock().unwrap().push(request.clone());
        self.reply("train").await
    }

    async fn fill_missing(&self, request: &ColumnsRequest) -> ClientResult<String> {
        self.fills.lock().unwrap().push(request.clone());
        self.reply("fillna").await
    }
}

struct Harness {
    service: Arc<FakeService>,
    state: SharedState,
    uploads: UploadController<FakeService>,
    analysis: AnalysisController<FakeService>,
}

fn harness() -> Harness {
    let service = Arc::new(FakeService::default());
    let state = shared_state(WorkflowState::new());
    Harness {
        uploads: UploadController::new(Arc::clone(&service), Arc::clone(&state)),
        analysis: AnalysisController::new(Arc::clone(&service), Arc::clone(&state)),
        service,
        state,
    }
}

fn csv() -> UploadFile {
    UploadFile::new("local.csv", b"region,units\nnorth,10\n".to_vec())
}

/// Upload the standard dataset, show its preview and tick `columns`
async fn uploaded_with(h: &Harness, columns: &[&str]) {
    h.service.script("upload", Ok(UPLOAD_OK));
    h.uploads.submit(Some(csv())).await.unwrap();
    assert!(h.analysis.load_preview());
    let mut state = lock_state(&h.state);
    for column in columns {
        assert!(state.set_column_checked(column, true));
    }
}

#[tokio::test]
async fn test_submit_without_file_makes_no_request() {
    let h = harness();
    let err = h.uploads.submit(None).await.unwrap_err();
    assert_eq!(err, ClientError::NoFileSelected);
    assert_eq!(h.service.total_calls(), 0);
    let state = lock_state(&h.state);
    assert!(state.dataset().is_none());
    assert_eq!(state.last_error(), Some(&ClientError::NoFileSelected));
}

#[tokio::test]
async fn test_upload_commits_titles_and_nulls() {
    let h = harness();
    h.service.script("upload", Ok(UPLOAD_OK));
    let handle = h.uploads.submit(Some(csv())).await.unwrap();
    assert_eq!(handle.name, "sales.csv");

    {
        let state = lock_state(&h.state);
        assert_eq!(
            state.column_titles().to_vec(),
            vec!["region", "units", "price", "discount", "returns"]
        );
        assert!(state.preview().is_empty());
        assert!(state.column_picker_visible());
        assert!(state.status().unwrap().message.contains("5 columns"));
        assert_eq!(state.fetched_preview()[0].get("discount"), Some(&CellValue::Null));
    }

    let model = ResultRenderer::render(&lock_state(&h.state));
    assert!(model.preview.is_none());
    assert_eq!(model.column_picker.unwrap().items.len(), 5);

    assert!(h.analysis.load_preview());
    let model = ResultRenderer::render(&lock_state(&h.state));
    let preview = model.preview.unwrap();
    assert!(preview.headers[0].highlighted);
    assert_eq!(preview.rows[1][1], "");
    assert_eq!(model.column_picker.unwrap().items.len(), 5);
}

#[tokio::test]
async fn test_failed_upload_leaves_state_unchanged() {
    let h = harness();
    uploaded_with(&h, &["units", "price"]).await;

    h.service.script("upload", Err(ClientError::NetworkFailure("500: boom".into())));
    let err = h.uploads.submit(Some(csv())).await.unwrap_err();
    assert!(matches!(err, ClientError::NetworkFailure(_)));

    h.service.script("upload", Ok(r#"{"message": "ok"}"#));
    let err = h.uploads.submit(Some(csv())).await.unwrap_err();
    assert!(matches!(err, ClientError::UnexpectedResponseShape(_)));

    let state = lock_state(&h.state);
    assert_eq!(state.dataset().map(|d| d.name.as_str()), Some("sales.csv"));
    assert_eq!(state.selected().to_vec(), vec!["units", "price"]);
    assert_eq!(state.preview().len(), 2);
}

#[tokio::test]
async fn test_plot_needs_two_columns() {
    let h = harness();
    uploaded_with(&h, &["units"]).await;

    let err = h.analysis.plot_pair().await.unwrap_err();
    assert_eq!(err, ClientError::InsufficientSelection { required: 2, selected: 1 });
    assert_eq!(h.service.calls("plot"), 0);

    lock_state(&h.state).set_column_checked("price", true);
    lock_state(&h.state).set_column_checked("returns", true);
    h.service.script("plot", Ok(r#"{"message": "Scatter plot created"}"#));
    assert_eq!(h.analysis.plot_pair().await.unwrap(), "Scatter plot created");
    assert_eq!(
        h.service.plots.lock().unwrap().clone(),
        vec![PlotRequest {
            column1: "units".into(),
            column2: "price".into()
        }]
    );
}

#[tokio::test]
async fn test_regression_targets_last_selected_column() {
    for columns in [
        vec!["units", "price"],
        vec!["units", "price", "returns"],
        vec!["region", "units", "price", "discount", "returns"],
    ] {
        let h = harness();
        uploaded_with(&h, &columns).await;
        h.analysis.request_regression_form().unwrap();

        let model = ResultRenderer::render(&lock_state(&h.state));
        let form = model.regression_form.unwrap();
        let features: Vec<&str> = form.features.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(features, columns[..columns.len() - 1].to_vec());
        assert_eq!(form.target.unwrap().label, *columns.last().unwrap());
        assert!(model.column_picker.is_none());

        h.service.script("train", Ok(r#"{"mse": 0.125}"#));
        assert_eq!(h.analysis.run_regression().await.unwrap(), 0.125);
        let trains = h.service.trains.lock().unwrap().clone();
        assert_eq!(trains.len(), 1);
        assert_eq!(trains[0].selected_columns, columns.iter().map(|c| c.to_string()).collect::<Vec<_>>());
        assert_eq!(lock_state(&h.state).mse(), Some(0.125));
    }
}

#[tokio::test]
async fn test_regression_with_one_column_is_a_no_op() {
    let h = harness();
    uploaded_with(&h, &["units"]).await;

    assert!(h.analysis.request_regression_form().is_err());
    assert_eq!(lock_state(&h.state).view_mode(), ViewMode::ColumnPicker);

    let err = h.analysis.run_regression().await.unwrap_err();
    assert_eq!(err, ClientError::InsufficientSelection { required: 2, selected: 1 });
    assert_eq!(h.service.calls("train"), 0);
    assert_eq!(lock_state(&h.state).mse(), None);
}

#[tokio::test]
async fn test_report_isolates_malformed_statistics() {
    let h = harness();
    uploaded_with(&h, &[]).await;
    h.service.script("describe", Ok(REPORT));
    h.analysis.load_descriptive_report().await.unwrap();

    let model = ResultRenderer::render(&lock_state(&h.state));
    let report = model.report.unwrap();
    assert_eq!(report.overview.as_deref(), Some("10 rows x 5 columns"));

    let stats = &report.statistics;
    assert_eq!(stats.columns, vec!["units", "price", "returns"]);
    let mean = stats.rows.iter().find(|r| r.statistic == "mean").unwrap();
    assert_eq!(mean.values, vec!["11.5", NOT_AVAILABLE, "0.5"]);
    let std = stats.rows.iter().find(|r| r.statistic == "std").unwrap();
    assert_eq!(std.values[0], NOT_AVAILABLE);

    let offered: Vec<(&str, bool)> = report
        .missing_values
        .iter()
        .map(|r| (r.column.as_str(), r.remove_nulls))
        .collect();
    assert_eq!(
        offered,
        vec![("region", false), ("units", true), ("price", false), ("returns", true)]
    );

    let region = report.unique_values.iter().find(|r| r.column == "region").unwrap();
    assert_eq!(region.value, UniqueCell::List(vec!["north".into(), "south".into()]));
    let units = report.unique_values.iter().find(|r| r.column == "units").unwrap();
    assert_eq!(units.value, UniqueCell::Scalar("7".into()));
}

#[tokio::test]
async fn test_failed_report_keeps_previous_one() {
    let h = harness();
    h.service.script("describe", Ok(REPORT));
    h.analysis.load_descriptive_report().await.unwrap();

    h.service.script("describe", Ok(r#"{"error": "No file uploaded yet"}"#));
    assert!(h.analysis.load_descriptive_report().await.is_err());

    let state = lock_state(&h.state);
    assert_eq!(state.report().unwrap().data_types.len(), 4);
    assert!(state.last_error().is_some());
}

#[tokio::test]
async fn test_overlapping_reports_last_response_wins() {
    let h = harness();
    let (first_tx, first_rx) = oneshot::channel();
    let (second_tx, second_rx) = oneshot::channel();
    let first_body = report_for("first");
    let second_body = report_for("second");
    h.service.script_gated("describe", Some(first_rx), Ok(first_body.as_str()));
    h.service.script_gated("describe", Some(second_rx), Ok(second_body.as_str()));

    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let a = h.analysis.clone();
            let b = h.analysis.clone();
            let one = tokio::task::spawn_local(async move { a.load_descriptive_report().await });
            let two = tokio::task::spawn_local(async move { b.load_descriptive_report().await });
            while h.service.calls("describe") < 2 {
                tokio::task::yield_now().await;
            }

            // The later request answers first
            second_tx.send(()).unwrap();
            while lock_state(&h.state).report().is_none() {
                tokio::task::yield_now().await;
            }
            assert!(lock_state(&h.state).report().unwrap().data_types.get("second").is_some());

            first_tx.send(()).unwrap();
            one.await.unwrap().unwrap();
            two.await.unwrap().unwrap();
        })
        .await;

    let state = lock_state(&h.state);
    let report = state.report().unwrap();
    assert!(report.data_types.get("first").is_some());
    assert!(report.data_types.get("second").is_none());
}

#[tokio::test]
async fn test_fill_missing_sends_single_column_without_refresh() {
    let h = harness();
    h.service.script("describe", Ok(REPORT));
    h.analysis.load_descriptive_report().await.unwrap();

    h.service.script(
        "fillna",
        Ok(r#"{"message": "ok", "data": {"mean_values": {"units": 11.5}, "null_values_sum": {"units": 0}, "updated_df": [{"units": 1}]}}"#),
    );
    let outcome = h.analysis.fill_missing("units").await.unwrap();
    assert_eq!(outcome.mean_values.get("units"), Some(&Some(11.5)));
    assert_eq!(outcome.remaining_nulls.get("units"), Some(&0));
    assert_eq!(
        h.service.fills.lock().unwrap().clone(),
        vec![ColumnsRequest {
            selected_columns: vec!["units".into()]
        }]
    );
    assert_eq!(h.service.calls("describe"), 1);
    assert_eq!(lock_state(&h.state).report().unwrap().missing("units"), Some(1));

    let err = h.analysis.fill_missing("").await.unwrap_err();
    assert!(matches!(err, ClientError::InsufficientSelection { .. }));
    assert_eq!(h.service.calls("fillna"), 1);
}

#[tokio::test]
async fn test_tail_keeps_selection_and_view() {
    let h = harness();
    uploaded_with(&h, &["units", "price"]).await;
    h.service.script(
        "tail",
        Ok(r#"{"tail": [{"region": "east", "units": 4, "price": NaN, "discount": 0.0, "returns": 0}]}"#),
    );
    assert_eq!(h.analysis.load_tail().await.unwrap(), 1);

    let state = lock_state(&h.state);
    assert_eq!(state.tail_rows()[0].get("price"), Some(&CellValue::Null));
    assert_eq!(state.selected().to_vec(), vec!["units", "price"]);
    assert_eq!(state.view_mode(), ViewMode::ColumnPicker);
    assert_eq!(state.preview().len(), 2);
}

#[tokio::test]
async fn test_new_upload_prunes_stale_selection() {
    let h = harness();
    uploaded_with(&h, &["units", "region"]).await;

    h.service.script(
        "upload",
        Ok(r#"{"message": "ok", "head": [{"units": 1, "weight": 2}]}"#),
    );
    h.uploads.submit(Some(csv())).await.unwrap();

    let state = lock_state(&h.state);
    assert_eq!(state.dataset().unwrap().name, "local.csv");
    assert_eq!(state.selected().to_vec(), vec!["units"]);
    assert_eq!(state.column_titles().to_vec(), vec!["units", "weight"]);
}
