pub mod clock;
pub mod config;
pub mod error;
pub mod model;
pub mod notify;
pub mod piece_api;
pub mod reminder;
pub mod storage;
pub mod timer;
