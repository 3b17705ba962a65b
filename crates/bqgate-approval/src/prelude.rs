//! Prelude module - commonly used types for convenient import.
//!
//! Use `use bqgate_approval::prelude::*;` to import all essential types.

pub use crate::{ApprovalError, ApprovalResult, ParticipantError};

// Classification
pub use crate::{ClassificationResult, Classifier, MatchPolicy};

// Tokens
pub use crate::{Clock, ConfirmationStore, SystemClock};

// Channels and verdicts
pub use crate::{
    ApprovalChannel, ApprovalFailure, ApprovalRequest, ApprovalVerdict, ElicitationChannel,
    SamplingChannel, TokenEchoChannel,
};

// Participants
pub use crate::{
    ElicitationAction, ElicitationParticipant, ElicitationRequest, ElicitationResponse,
    SamplingParticipant, SamplingRequest, SamplingResponse,
};
