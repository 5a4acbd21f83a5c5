//! Core layer - Framework-agnostic classroom business logic
//!
//! Everything here works on a SeaORM connection and returns structured data;
//! the bot layer only formats and sends it.

/// Class labels known to the school
pub mod classroom;
/// Injectable calendar clock and ISO week identifiers
pub mod clock;
/// Subjects, grade entry and transcripts
pub mod grade;
/// Dashboard statistics, weekly reports and student timelines
pub mod report;
/// Fuzzy matching of ID card fields against the roster
pub mod resolver;
/// Weekly archive, reset and logical week advance
pub mod rollover;
/// Roster management and live score updates
pub mod student;
/// Key/value system settings
pub mod system_config;
/// Recording and undoing violations
pub mod violation;
/// Violation rules
pub mod violation_type;
