pub mod analysis_client;
pub mod analysis_controller;
pub mod renderer;
pub mod result_parser;
pub mod upload_controller;

pub use analysis_client::{AnalysisService, ColumnsRequest, HttpAnalysisService, PlotRequest, UploadFile};
pub use analysis_controller::AnalysisController;
pub use renderer::{RenderModel, ResultRenderer};
pub use result_parser::{ResultParser, UploadResponse};
pub use upload_controller::UploadController;
