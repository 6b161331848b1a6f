//! Heuristics module for the TSP.
//!
//! This module exports the construction, local search and Iterated Local
//! Search heuristics.

pub mod construction;
pub mod local_search;
pub mod ils;

pub use construction::*;
pub use local_search::*;
pub use ils::*;
