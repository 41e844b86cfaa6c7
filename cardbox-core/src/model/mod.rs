//! Domain model: cards, tags, and the hash derivations that key them.

pub mod bitmap;
pub mod card;
pub mod tag;

pub use card::Card;
pub use tag::Tag;
