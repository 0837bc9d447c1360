pub mod dashboard;
pub mod response;
pub mod stock;

pub use dashboard::*;
pub use response::*;
pub use stock::*;
