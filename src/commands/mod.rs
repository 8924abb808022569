pub mod bookmarks;
pub mod plan;
pub mod split;
