//! Test harness for end-to-end quote workflows.
//!
//! Scripts uploads and selection changes against a real quote session,
//! verifies the results at every step and prints diagnostic reports.
//!
//! # Key Components
//!
//! - [`QuoteBuilder`]: Fluent API for driving a quote session
//! - [`oracle`]: Verification functions returning pass/fail verdicts
//! - [`report`]: Structured text run reports
//! - [`helpers`]: Fixture meshes, STL byte builders, scripted fetchers
//! - [`assertions`]: Rich assertion helpers with diagnostics

pub mod assertions;
pub mod helpers;
pub mod oracle;
pub mod report;
pub mod workflow;

pub use helpers::{FixtureFetcher, HarnessError};
pub use oracle::OracleVerdict;
pub use report::QuoteRunReport;
pub use workflow::QuoteBuilder;
