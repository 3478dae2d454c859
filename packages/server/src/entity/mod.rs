pub mod category;
pub mod importation;
pub mod product;
pub mod user;
