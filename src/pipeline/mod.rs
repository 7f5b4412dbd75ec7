pub mod config;
pub mod pipeline;

pub use config::PipelineConfig;
pub use pipeline::Pipeline;
