//! Dispatch: the application handler trait and the bounded inbound pipeline
//! that feeds it.

pub mod dispatcher;
pub mod pipeline;

pub use dispatcher::Dispatcher;
pub use pipeline::{InboundPipeline, InboundSender, PipelineStats};
