//! Business logic services.

pub mod audit;
pub mod candidate;
pub mod election;
pub mod position;
pub mod user;
pub mod voter;
pub mod voting;

pub use audit::{AuditEntry, AuditService, ChangeSet, RequestMeta, SubjectRef};
pub use candidate::{CandidateInput, CandidateService};
pub use election::{ElectionInput, ElectionService, ElectionStatus};
pub use position::{PositionInput, PositionService};
pub use user::UserService;
pub use voter::VoterService;
pub use voting::{
    CastOutcome, VoteContext, VoteError, VoteSelection, VotingService, election_accepts_votes,
};
