//! hireform - a terminal wizard for multi-step employment applications
//!
//! The library holds the form model, the step wizard, attachment staging
//! and the submission pipeline; the binary wires them to a ratatui screen
//! and a headless `submit` command.

pub mod api;
pub mod app;
pub mod attachments;
pub mod config;
pub mod form;
pub mod headless;
pub mod logging;
pub mod submission;
pub mod ui;
pub mod upload;
pub mod wizard;
