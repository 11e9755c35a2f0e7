//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod consultation_repo;
pub mod event_repo;
pub mod notification_repo;
pub mod project_repo;
pub mod user_repo;

pub use consultation_repo::ConsultationRepo;
pub use event_repo::EventRepo;
pub use notification_repo::NotificationRepo;
pub use project_repo::ProjectRepo;
pub use user_repo::UserRepo;
