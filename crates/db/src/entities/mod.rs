//! Entity definitions.

#![allow(missing_docs)]

pub mod attendance;
pub mod audit_log;
pub mod candidate;
pub mod election;
pub mod position;
pub mod user;
pub mod vote;
pub mod voter;

pub use attendance::Entity as Attendance;
pub use audit_log::Entity as AuditLog;
pub use candidate::Entity as Candidate;
pub use election::Entity as Election;
pub use position::Entity as Position;
pub use user::Entity as User;
pub use vote::Entity as Vote;
pub use voter::Entity as Voter;
