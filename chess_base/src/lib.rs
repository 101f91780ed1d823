//! # Base types for finchess
//!
//! This is an auxiliary crate for `finchess`, which contains some core stuff. It was split from the main crate,
//! so everything declared here can be used in the build script for `finchess`.
//!
//! Normally you don't want to use this crate directly. Use `finchess` instead.

pub mod bitboard;
pub mod bitboard_consts;
pub mod geometry;
pub mod types;
