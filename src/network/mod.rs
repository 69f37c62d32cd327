//! Network providers and batched chain reads

pub mod multicall;
pub mod providers;
pub mod retry;

pub use multicall::*;
pub use providers::*;
pub use retry::*;
