//! Domain types and models

pub mod enums;
pub mod session;
pub mod user;

pub use enums::{App, State, UserType};
pub use session::Session;
pub use user::{numeric_id, School, UserProfile};
