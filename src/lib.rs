//! Internship Hub - internship application tracker backend
//!
//! A REST API where users register, verify their email, log in and keep
//! track of their internship applications and resumes.

pub mod core;
