//! Stable exit codes for bootseq CLI commands.

/// Every step succeeded, or only warn-and-continue steps failed.
pub const OK: i32 = 0;
/// An abort-policy step failed; the diagnostic names the step.
pub const ABORTED: i32 = 1;
/// Invalid invocation or configuration, or an error outside the step sequence.
pub const INVALID: i32 = 2;
