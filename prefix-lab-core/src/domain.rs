pub mod ids;
pub mod config;
pub mod dataset;
pub mod model;
pub mod evaluation;
pub mod experiment;

pub use ids::*;
pub use config::*;
pub use dataset::*;
pub use model::*;
pub use evaluation::*;
pub use experiment::*;
