mod board;
mod engine;
mod ticker;

pub use board::TimerBoard;
pub use engine::CountdownState;
pub use ticker::{TickerArena, DEFAULT_PERIOD};
