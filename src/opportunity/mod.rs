pub mod evaluator;
pub mod types;

pub use evaluator::evaluate;
pub use types::{RawAmounts, TradeDecision, TradeParams};
