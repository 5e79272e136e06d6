//! Command-line front end for release validation.

#![allow(missing_docs)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod summary;
