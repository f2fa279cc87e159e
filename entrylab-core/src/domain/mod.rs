//! Domain types: candles in, regime tags and entry events out.

pub mod candle;
pub mod entry;
pub mod regime;

pub use candle::Candle;
pub use entry::{EntryEvent, Side};
pub use regime::RegimeTag;
