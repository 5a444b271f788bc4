pub mod health;
pub mod images;
pub mod routes;

pub use routes::create_routes;
