pub mod media;
pub mod root;
