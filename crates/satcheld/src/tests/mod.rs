//! Test suites for the Satchel daemon bootstrap.

mod support;
