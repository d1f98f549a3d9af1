pub mod media_client;
pub mod metadata;
pub mod provider;
pub mod staging;
pub mod upload_service;
