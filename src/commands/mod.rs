//! CLI command implementations
//!
//! `transfer` and `info` run against an open session and are dispatched
//! through [`crate::programmers::with_session`]; `list` needs no device.

mod info;
mod list;
mod transfer;

pub use info::Info;
pub use list::list_programmers;
pub use transfer::Transfer;
