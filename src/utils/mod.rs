pub mod error;
pub mod logger;
pub mod main_utils;
pub mod monitor;
pub mod validation;
