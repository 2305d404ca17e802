pub mod auth;
pub mod bookmarks;
pub mod charts;
pub mod datasets;
pub mod folders;
pub mod geocode;
pub mod map;
