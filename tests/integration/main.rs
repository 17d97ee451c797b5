//! Integration suite: the same plugin sets driven through all three
//! reference hosts, asserting host-independent observable behavior.

mod helpers;

mod conformance_test;
mod diagnostics_test;
mod filter_test;
mod lifecycle_test;
mod sourcemap_test;
