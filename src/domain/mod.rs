pub mod message;
pub mod payload;
pub mod roster;
