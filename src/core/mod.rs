//! Core domain models and business logic for the internship tracker

pub mod applications;
pub mod auth;
pub mod config;
pub mod db;
pub mod mail;
pub mod server;
