pub mod pipeline;
pub mod split;
pub mod stability;
pub mod tasks;

pub use pipeline::*;
pub use split::*;
pub use stability::*;
pub use tasks::*;
