// Library exports for the rotating CSV logger

pub mod cli;
pub mod config;
pub mod error;
pub mod logs;
pub mod record;
