//! taskgrid-placement — matching descriptors against the roster.
//!
//! Before anything new is launched, every descriptor is offered the idle
//! tasks already on the roster. This crate makes that decision; it never
//! mutates the roster and never talks to the resource manager. The
//! manager acts on the resulting [`MatchPlan`].
//!
//! # Components
//!
//! - **`matcher`** — Candidate eligibility and first-fit matching

pub mod matcher;

pub use matcher::{MatchPlan, effective_constraints, is_candidate, match_descriptors};
