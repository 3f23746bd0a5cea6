pub mod base;
pub mod cache;
pub mod sim;
pub mod ui;
