//! Database models split into domain-specific modules.

pub mod common;
pub mod department;
pub mod document;
pub mod employee;
pub mod position;
pub mod user;

pub use common::*;
pub use department::*;
pub use document::*;
pub use employee::*;
pub use position::*;
pub use user::*;
