pub mod auth;
pub mod product;
