//! # DARS Common Library
//!
//! Shared code for the DARS audit toolkit:
//! - Requirement and resolved-course models
//! - Common error types
//! - TOML configuration loading

pub mod config;
pub mod error;
pub mod models;

pub use error::{Error, Result};
pub use models::{
    CourseReference, CourseStatus, Requirement, RequirementClasses, ResolvedCourse, TakenCourse,
    Units,
};
