pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod server;

pub use config::Config;
pub use error::RunnerError;
pub use pipeline::{Pipeline, ShapedResponse, SplitMode};
