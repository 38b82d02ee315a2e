pub mod config;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod process;
pub mod schema;

pub use config::Config;
pub use error::{PipelineError, Rejected};
pub use pipeline::{build, BuildReport};
