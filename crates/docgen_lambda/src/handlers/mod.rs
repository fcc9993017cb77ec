pub mod documents;
mod listing;
pub mod resources;
pub mod response;
