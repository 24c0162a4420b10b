// src/filesystem/mod.rs

//! Filesystem helpers for the conversion pipeline
//!
//! This module provides:
//! - Sanitization of untrusted archive paths and their `/`-separated rendering
//! - Deterministic traversal of extracted wheel trees

pub mod path;
mod walk;

pub use walk::scan_files;
