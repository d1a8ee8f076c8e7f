//! User lookup operations

pub mod get_users;

pub use get_users::{GetUsersOperation, HelixUser};
