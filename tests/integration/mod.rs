//! Integration Tests Module
//!
//! End-to-end tests for the analysis engine: producer fan-out, merging,
//! the safety gate, consensus backoff, cancellation and record storage.

// Shared test doubles
mod support;


// Consensus rate-limit backoff
mod consensus_retry_test;

// Merge engine set properties
mod merge_properties_test;

// Full producer pipeline over scripted adapters
mod producer_pipeline_test;
