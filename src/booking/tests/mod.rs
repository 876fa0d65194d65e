//! Unit tests for the booking lifecycle.

mod service_tests;
