pub mod auth;
pub mod input;
pub mod path;
pub mod query;
