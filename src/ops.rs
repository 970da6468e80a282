//! Operations module for the external version-control client.
//!
//! [`git`] wraps the git binary behind a trait with real and mock
//! implementations so the checkout sequence can be tested without touching
//! the network or the filesystem.

pub mod git;
