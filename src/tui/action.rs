use serde::{Deserialize, Serialize};
use std::fmt;

/// All user-triggerable actions in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Action {
    // Navigation
    MoveUp,
    MoveDown,
    NextPane,
    PrevPane,

    // Dataset
    Upload,
    ShowPreview,
    LoadTail,

    // Analysis
    LoadReport,
    ToggleColumn,
    PlotPair,
    OpenRegressionForm,
    FillMissing,

    // Application
    ToggleHelp,
    Confirm,
    Cancel,
    Quit,
}

impl Action {
    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Action::MoveUp => "Move cursor up",
            Action::MoveDown => "Move cursor down",
            Action::NextPane => "Focus next pane",
            Action::PrevPane => "Focus previous pane",
            Action::Upload => "Upload a dataset",
            Action::ShowPreview => "Show uploaded head rows",
            Action::LoadTail => "Fetch tail rows",
            Action::LoadReport => "Fetch descriptive report",
            Action::ToggleColumn => "Check/uncheck column",
            Action::PlotPair => "Plot first two selected columns",
            Action::OpenRegressionForm => "Open linear regression form",
            Action::FillMissing => "Remove null values in column",
            Action::ToggleHelp => "Toggle help screen",
            Action::Confirm => "Confirm / submit regression",
            Action::Cancel => "Cancel input",
            Action::Quit => "Quit application",
        }
    }

    /// Get category for grouping in help screen
    pub fn category(&self) -> ActionCategory {
        match self {
            Action::MoveUp | Action::MoveDown | Action::NextPane | Action::PrevPane => {
                ActionCategory::Navigation
            }
            Action::Upload | Action::ShowPreview | Action::LoadTail => ActionCategory::Dataset,
            Action::LoadReport
            | Action::ToggleColumn
            | Action::PlotPair
            | Action::OpenRegressionForm
            | Action::FillMissing => ActionCategory::Analysis,
            Action::ToggleHelp | Action::Confirm | Action::Cancel | Action::Quit => {
                ActionCategory::Application
            }
        }
    }

    /// Get all possible actions (for validation)
    pub fn all() -> Vec<Action> {
        vec![
            Action::MoveUp,
            Action::MoveDown,
            Action::NextPane,
            Action::PrevPane,
            Action::Upload,
            Action::ShowPreview,
            Action::LoadTail,
            Action::LoadReport,
            Action::ToggleColumn,
            Action::PlotPair,
            Action::OpenRegressionForm,
            Action::FillMissing,
            Action::ToggleHelp,
            Action::Confirm,
            Action::Cancel,
            Action::Quit,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionCategory {
    Navigation,
    Dataset,
    Analysis,
    Application,
}

impl fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionCategory::Navigation => write!(f, "Navigation"),
            ActionCategory::Dataset => write!(f, "Dataset"),
            ActionCategory::Analysis => write!(f, "Analysis"),
            ActionCategory::Application => write!(f, "Application"),
        }
    }
}
