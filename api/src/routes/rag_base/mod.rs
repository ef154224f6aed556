pub mod reset_vector_base_route;
pub mod search_vector_base_request;
pub mod search_vector_base_response;
pub mod search_vector_base_route;
