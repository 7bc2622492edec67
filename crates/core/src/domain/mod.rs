pub mod catalog;
pub mod item;
pub mod outfit;
pub mod suggestion;
