//! Utility modules for azstore

pub mod format;
pub mod helpers;
pub mod network;
pub mod paging;
