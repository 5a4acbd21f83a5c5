//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod classroom;
pub mod grade;
pub mod student;
pub mod subject;
pub mod system_config;
pub mod violation;
pub mod violation_type;
pub mod weekly_archive;

// Re-export specific types to avoid conflicts
pub use classroom::{Column as ClassroomColumn, Entity as Classroom, Model as ClassroomModel};
pub use grade::{Column as GradeColumn, Entity as Grade, Model as GradeModel};
pub use student::{Column as StudentColumn, Entity as Student, Model as StudentModel};
pub use subject::{Column as SubjectColumn, Entity as Subject, Model as SubjectModel};
pub use system_config::{
    Column as SystemConfigColumn, Entity as SystemConfig, Model as SystemConfigModel,
};
pub use violation::{Column as ViolationColumn, Entity as Violation, Model as ViolationModel};
pub use violation_type::{
    Column as ViolationTypeColumn, Entity as ViolationType, Model as ViolationTypeModel,
};
pub use weekly_archive::{
    Column as WeeklyArchiveColumn, Entity as WeeklyArchive, Model as WeeklyArchiveModel,
};
