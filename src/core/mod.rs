pub mod error;
pub mod report;
pub mod state;
pub mod types;

pub use error::{ClientError, ClientResult, ParseError};
pub use report::{
    ColumnMap, ColumnStatistics, DescriptiveReport, FillMissingOutcome, STATISTIC_NAMES, SummaryStats,
    UniqueSummary,
};
pub use state::{SharedState, StatusLevel, StatusLine, WorkflowState, lock_state, shared_state};
pub use types::*;
