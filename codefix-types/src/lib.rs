//! Shared DTOs (schemas-as-code) for the codefix workspace.
//!
//! # Design constraints
//! - These types cross the host boundary as JSON; field names follow the host's
//!   PascalCase contract.
//! - Lines and columns are 1-based, columns count `char`s, end positions are exclusive.
//! - Prefer adding optional fields over changing semantics.

pub mod diagnostic;
pub mod edit;
pub mod response;

/// Request endpoint names exposed to the host's router.
pub mod endpoints {
    pub const CODE_CHECK_WITH_FIXES: &str = "/codefix/codecheckwithfixes";
    pub const AVAILABLE_FIXES: &str = "/codefix/fixes";
    pub const RUN_FIX: &str = "/codefix/runfix";
}
