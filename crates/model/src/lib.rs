pub mod errors;
pub mod product;
pub mod purchase;
pub mod rights;
pub mod session;
pub mod subscription;
pub mod user;
