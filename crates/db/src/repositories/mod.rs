//! Repository layer.
//!
//! Repositories hold a shared connection and expose the queries the
//! services need. Vote-path writers take an explicit connection so the
//! voting service can run them inside one transaction.

mod attendance;
mod audit_log;
mod candidate;
mod election;
mod position;
mod user;
mod vote;
mod voter;

pub use attendance::AttendanceRepository;
pub use audit_log::AuditLogRepository;
pub use candidate::CandidateRepository;
pub use election::ElectionRepository;
pub use position::PositionRepository;
pub use user::UserRepository;
pub use vote::VoteRepository;
pub use voter::VoterRepository;
