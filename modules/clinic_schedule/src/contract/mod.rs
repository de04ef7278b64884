pub mod client;
pub mod error;
pub mod model;
pub mod time;

pub use model::*;
pub use time::{ParseWallTimeError, WallTime};
