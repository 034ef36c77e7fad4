pub mod error;
pub mod events;
pub mod fan_out;
pub mod item_diff;
pub mod models;
pub mod partition;
pub mod ports;
pub mod row_mapper;
