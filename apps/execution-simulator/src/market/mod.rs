//! Synthetic market data and the randomness behind it.

mod random;
mod simulator;

pub use random::{RandomSource, SeededRandom};
pub use simulator::{HISTORY_CAPACITY, MarketDataSimulator, QuoteCallback, seed_range};
