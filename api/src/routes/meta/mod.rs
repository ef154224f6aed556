pub mod health_route;
pub mod suggestions_route;
