pub mod extractors;
pub mod jwt;
pub mod middleware;

pub use extractors::{AuthRequired, StaffRequired};
pub use jwt::{AuthConfig, Claims};
