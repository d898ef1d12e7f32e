pub mod batch;
pub mod chain;
pub mod compose;
pub mod custom;
pub mod error;
pub mod filter;
pub mod layout;

pub use error::{Error, Result};
pub use filter::{Filter, RgbaImage};
