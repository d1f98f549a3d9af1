pub mod provider;
pub mod staging;
