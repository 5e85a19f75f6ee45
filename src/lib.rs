//! Crossroads - Dilemma Analysis Backend
//!
//! Runs free-text personal dilemmas through a three-stage LLM pipeline
//! (deep analysis, decision arbitration, deterministic formatting) and
//! coerces the result into a structured decision record.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
