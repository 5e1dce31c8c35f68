pub mod config;
pub mod move_event;
pub mod navigate;
pub mod view;
