pub mod adapter;
pub mod instructions;
pub mod parser;

pub use adapter::SplTokenSwapAdapter;
pub use parser::SplTokenSwapParser;
