//! Pipeline components: shared context, worker pool, collector, supervisor.
//!
//! Workers → bounded batch channel → collector (dedup + sink) on the calling thread.

pub mod collector;
pub mod context;
pub mod orchestrator;
pub mod worker;

pub use collector::{CollectParams, Collected, Collector};
pub use context::{
    PipelineChannels, RunningGuard, StopSignal, WorkerStates, create_pipeline_channels,
};
pub use orchestrator::{RunEnd, Supervisor, SupervisorState, describe_reason, shutdown_workers};
pub use worker::{WorkerContext, generate_batch, spawn_workers};
