//! Harness for end-to-end pipeline tests against the builtin connectors.

pub mod harness;
