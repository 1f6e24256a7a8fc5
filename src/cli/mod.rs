//! Handles Command Line Interface (CLI) related functionalities.
//!
//! Includes the menu action dispatch, the prompt flow that gathers user input
//! (choice lists built from fetched rows, conditional prompts), and the
//! tabular rendering of query results.

mod commands;
mod prompts;
mod render;

pub use commands::*;
pub use prompts::*;
pub use render::*;
