pub mod application;
pub mod config;
pub mod domain;
pub mod ecs_service;
pub mod infrastructure;
