pub mod logs_route;
