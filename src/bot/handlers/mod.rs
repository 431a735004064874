//! Discord interaction handlers
//!
//! This module turns gateway events (reactions, rate limits) into calls on the
//! interactive message handler.

/// Gateway event routing for reactions and rate limits
pub mod events;
