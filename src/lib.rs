//! Stockroom Library
//!
//! Core functionality for the Stockroom stock-tracking application: the
//! catalog store and its consistency rules, slug derivation, icon
//! resolution, and the assisted-intake channel backed by an external
//! conversational model.

// Module declarations
pub mod config;
pub mod defaults;
pub mod icons;
pub mod intake;
pub mod models;
pub mod slug;
pub mod store;
pub mod web;
