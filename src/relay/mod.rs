//! Relays between the upstream model and HTTP clients
//!
//! Two shapes, both stateless:
//! - [`stream_document`]: sequential multi-section generation emitting
//!   newline-delimited JSON events as tokens arrive.
//! - [`run_agent`]: one blocking call whose text output must parse as
//!   JSON after markdown fence stripping.

mod batch;
mod json;
mod stream;

pub use batch::{AgentJob, AgentOutcome, BatchError, run_agent};
pub use json::{ParseError, parse_model_output, strip_fences};
pub use stream::{DocumentJob, StreamSettings, stream_document};
