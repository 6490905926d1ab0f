//! Building blocks the game session is composed from.

pub mod autoplay;
pub mod pool;
pub mod timer;
