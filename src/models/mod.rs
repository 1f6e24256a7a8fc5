//! Defines the data structures and models used throughout the application.
//!
//! Each query has its own fixed row struct; the presentation layer projects
//! these typed fields into table columns.

mod org;

pub use org::*;
