//! Integration tests for the platform primitives.

mod common;
mod cycles_test;
mod ffi_test;
mod random_test;
mod timing_test;
