pub mod constants;

pub mod span;
pub use span::*;

pub mod u256;
pub use u256::U256;
