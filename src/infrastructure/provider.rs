use crate::config::AppConfig;
use crate::services::provider::MediaProvider;
use crate::services::provider::cloudinary::CloudinaryProvider;
use std::sync::Arc;
use tracing::info;

pub fn setup_provider(config: &AppConfig) -> Arc<dyn MediaProvider> {
    info!(
        "☁️  Media provider: {} (Cloud: {}, signatures: {:?})",
        config.api_base, config.credentials.cloud_name, config.signature_algorithm
    );

    Arc::new(CloudinaryProvider::new(
        config.credentials.clone(),
        config.api_base.clone(),
        config.signature_algorithm,
    ))
}
