pub mod args;
pub mod status;

pub use args::{parse_runtime_args, RunMode, RuntimeArgs};
pub use status::{emit_deploy_status, emit_health_status, emit_pipeline_status, emit_runtime_status};
