pub mod initialize_request;
pub mod initialize_route;
