//! swaparb - single-shot arbitrage between two SPL Token Swap pools

pub mod app;
pub mod config;
pub mod exchanges;
pub mod math;
pub mod opportunity;
pub mod report;
pub mod shared;
