pub mod corpus;
pub mod prefix;
pub mod vectorize;
pub mod classifiers;
pub mod evaluation;
pub mod reporting;

pub use corpus::*;
pub use prefix::*;
pub use vectorize::*;
pub use classifiers::*;
pub use evaluation::*;
pub use reporting::*;
