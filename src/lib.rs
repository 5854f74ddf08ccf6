//! portal-assist - chat-completion gateway for a college portal
//!
//! Answers free-text student questions and summarises exam results by calling a
//! primary generation provider and falling back to a secondary one. Failures are
//! classified into a small set of client-facing responses (rate limited with a
//! retry hint, or a generic server error).

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod gateway;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod prompt;
pub mod providers;
pub mod records;
pub mod telemetry;
