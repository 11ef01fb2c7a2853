//! Tests for the verification workflow

mod flow_tests;
