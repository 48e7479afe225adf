//! Behavioural suites for the broker runtime.

mod support;
