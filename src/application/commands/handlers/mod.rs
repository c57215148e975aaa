//! Command Handlers

mod synthesis_handlers;

pub use synthesis_handlers::{
    output_stamp, OrchestratorConfig, RequestOrchestrator, RequestState, MERGED_FILE_NAME,
};
