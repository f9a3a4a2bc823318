pub mod error;
pub mod trip;
pub mod user;
pub mod vehicle;
