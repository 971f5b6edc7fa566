mod queries;
mod repository;
mod schema;

pub use repository::Repository;
