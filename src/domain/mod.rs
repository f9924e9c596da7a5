// Domain layer - Pure types and transformations
pub mod chart;
pub mod device;
pub mod export;
pub mod metric;
pub mod sample;
pub mod time_window;
pub mod user;
