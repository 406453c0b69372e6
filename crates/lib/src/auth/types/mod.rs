//! Authorization type definitions for warden
//!
//! This module contains the core types used for authorization,
//! organized into logical submodules.

pub mod conversions;
pub mod permissions;


pub use permissions::*;
