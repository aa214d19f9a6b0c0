//! modelaudit_engine - Formula-consistency analysis for sheet grids.

pub mod engine;
