//! Virtual try-on job flow.
//!
//! - submit garment/model descriptors to `/ai/virtual/tryon-pro`
//! - extract the task id from the submit response
//! - poll `/ai/virtual/tryon-results` until the task reports `finished`

mod client;
mod types;

pub use client::{RESULTS_ENDPOINT, SUBMIT_ENDPOINT, TryOnClient};
pub use types::{
    FINISHED, Garment, ModelSpec, PollOutcome, TaskHandle, TaskStatus, TryOnRequest,
};
