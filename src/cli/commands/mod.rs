//! Command implementations

pub mod list;
pub mod remove;
pub mod score;
pub mod show;
pub mod trace;
pub mod validate;
