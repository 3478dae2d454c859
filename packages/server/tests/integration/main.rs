
mod auth;
mod import;
