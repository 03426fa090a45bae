pub mod config;
pub mod logger;
pub mod math;
pub mod units;
