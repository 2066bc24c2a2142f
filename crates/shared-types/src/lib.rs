pub mod analysis;
pub mod error;
pub mod feature_flags;
pub mod grade;
pub mod sheet;

pub use analysis::*;
pub use error::*;
pub use feature_flags::*;
pub use grade::*;
pub use sheet::*;
