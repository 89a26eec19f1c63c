//! Narrowing changed paths to those matching configured glob patterns.

pub mod filter;

pub use filter::PathFilter;
