//! Runtime utilities for Whalescope.
#![allow(missing_docs)]

pub mod health;
pub mod shutdown;
