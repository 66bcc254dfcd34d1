//! # services
//!
//! Application services orchestrating the domain ports: accounts and the
//! follow graph, publishing and comment threads, and comment moderation.
//! Authorization stays at the web layer; these own input validation and
//! feed/paging semantics.

pub mod accounts;
pub mod moderation;
pub mod posts;

pub use accounts::{AccountService, NewAccount};
pub use moderation::ModerationService;
pub use posts::PostService;
