//! Lot aggregate.
//!
//! A lot owns the ordered list of every document version attached to it.
//! The aggregate is loaded and saved as a whole through [`LotRepository`].

mod repository;
mod types;

pub use repository::LotRepository;
pub use types::{Lot, LotStatus, Period};
