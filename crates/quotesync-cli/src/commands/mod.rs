//! Command handlers

pub mod config;
pub mod filter;
pub mod quote;
pub mod status;
pub mod sync;
pub mod transfer;
