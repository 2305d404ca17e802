//! Domain logic for atlasboard: bookmarks, map views, population tables
//! and chart specifications. No I/O happens in this crate.

pub mod bookmark;
pub mod chart;
pub mod error;
pub mod export;
pub mod map;
pub mod numeric;
pub mod population;
pub mod region;
pub mod table;
pub mod types;
