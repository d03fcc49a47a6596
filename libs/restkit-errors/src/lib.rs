//! Error and result types for restkit
//!
//! This crate provides pure data types with no dependencies on HTTP
//! frameworks. It includes:
//! - RFC 9457 Problem Details (`Problem`) as received from remote APIs
//! - The `ApiResult` envelope returned by every REST call
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod problem;
pub mod result;

pub use problem::{ABOUT_BLANK, APPLICATION_PROBLEM_JSON, Problem, ValidationViolation};
pub use result::{ApiResult, FailureKind};
