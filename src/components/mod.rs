pub mod admin;
pub mod ui;

pub use admin::*;
