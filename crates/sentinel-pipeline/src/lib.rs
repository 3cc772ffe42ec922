//! The submission pipeline (C8): the only crate in the governance core
//! that performs an external side effect, and the only one with a non-dev
//! `tokio` dependency. Everything upstream of the external call — boundary
//! checks, duplicate guarding, friction, confirmation consumption, audit
//! writes — stays synchronous; only the network call itself is `async`,
//! and it is always bounded by a caller-supplied deadline.

#![deny(unsafe_code)]

mod clients;
mod error;
mod pipeline;

pub use clients::{
    SubmissionPlatformClient, SubmissionReceipt, SubmissionRequest, SubmissionStatus, TruthEngineClient,
    TruthEngineRequest, TruthEngineVerdict,
};
#[cfg(feature = "reqwest_clients")]
pub use clients::reqwest_clients;
pub use error::{PipelineError, TransmissionFailure};
pub use pipeline::{PreparedSubmission, SubmissionPipeline, SubmitRequest};
