use crate::config::AppConfig;
use crate::models::MediaKind;
use std::io;
use tracing::{info, warn};

/// Creates the per-kind staging and metadata directories and reports files
/// left in staging by an earlier crash. Leftovers are not touched: they may
/// belong to another instance sharing the directory.
pub async fn setup_directories(config: &AppConfig) -> io::Result<()> {
    for kind in [MediaKind::Image, MediaKind::Video] {
        let staging = config.staging_dir.join(kind.dir_name());
        let metadata = config.metadata_dir.join(kind.dir_name());
        tokio::fs::create_dir_all(&staging).await?;
        tokio::fs::create_dir_all(&metadata).await?;

        let mut entries = tokio::fs::read_dir(&staging).await?;
        let mut leftovers = 0usize;
        while entries.next_entry().await?.is_some() {
            leftovers += 1;
        }
        if leftovers > 0 {
            warn!(
                "🧹 {} file(s) left over in {}; staging is expected to be empty",
                leftovers,
                staging.display()
            );
        }
    }

    info!(
        "📁 Staging: {} | Metadata: {}",
        config.staging_dir.display(),
        config.metadata_dir.display()
    );
    Ok(())
}
