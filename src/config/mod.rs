/// AI service settings from environment variables
pub mod ai;

/// Database configuration and connection management
pub mod database;

/// Class and rule seeding from config.toml
pub mod seed;
