#![allow(clippy::collapsible_if)]

pub mod config;
pub mod core;
pub mod logging;
pub mod services;
pub mod tui;

// Re-export commonly used types
pub use core::{ClientError, ClientResult, DescriptiveReport, SharedState, WorkflowState};
pub use services::{
    AnalysisController, AnalysisService, HttpAnalysisService, RenderModel, ResultParser, ResultRenderer,
    UploadController,
};
pub use tui::{Action, ActionCategory};
