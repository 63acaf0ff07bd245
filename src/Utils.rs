//! different utility modules used throughout the project
/// tiny module to initialize console logging
pub mod logger;
