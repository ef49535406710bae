//! Core business logic layer
//!
//! This module contains the data model, the command dispatcher and the facade
//! that form the heart of the client.

pub mod cache;
pub mod command;
pub mod data;
pub mod dispatcher;
pub mod facade;
pub mod lister;
pub mod traits;
pub mod updates;
