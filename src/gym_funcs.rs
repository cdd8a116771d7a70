pub mod chain;
pub mod corridor;
pub mod target_reach;
