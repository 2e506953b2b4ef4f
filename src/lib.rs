//! Build-pipeline orchestration and source conformance checks for the jansson
//! C++ modernization.
//!
//! Pipelines shell out to the external toolchain one step at a time and stop
//! at the first failure; conformance checks evaluate a regex rule table
//! against a single source file. Both produce plain data that [`report`]
//! turns into text and an exit code.
pub mod capture;
pub mod cli;
pub mod config;
pub mod conformance;
pub mod doctor;
pub mod excerpt;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod rules;
pub mod runner;
pub mod workflow;
