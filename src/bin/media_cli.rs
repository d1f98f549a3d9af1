use clap::{Parser, Subcommand};
use cloud_media_gateway::config::AppConfig;
use cloud_media_gateway::infrastructure::provider;
use cloud_media_gateway::models::MediaKind;
use cloud_media_gateway::services::media_client::{CONFIRMATION_TOKEN, Confirmation, MediaClient};
use dotenvy::dotenv;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Operate on hosted media directly, without the HTTP server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Media kind the command applies to
    #[arg(short, long, value_enum, default_value = "image", global = true)]
    kind: KindArg,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum KindArg {
    Image,
    Video,
}

impl From<KindArg> for MediaKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Image => MediaKind::Image,
            KindArg::Video => MediaKind::Video,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a local file
    Upload { path: PathBuf },
    /// Delete one asset by public ID
    Delete { public_id: String },
    /// Delete every asset carrying a tag (irreversible)
    DeleteByTag {
        tag: String,
        /// Skip the interactive confirmation
        #[arg(long)]
        yes: bool,
    },
    /// List the URLs of every asset carrying a tag
    ListByTag { tag: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cloud_media_gateway=warn,media_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = AppConfig::from_env()?;
    let kind = MediaKind::from(cli.kind);
    let client = MediaClient::new(provider::setup_provider(&config), kind, &config.campaign_tag);

    match cli.command {
        Command::Upload { path } => {
            if !path.is_file() {
                error!("❌ Not a file: {}", path.display());
                std::process::exit(1);
            }
            match client.upload(&path).await {
                Ok(asset) => {
                    println!("Upload successful!");
                    println!("  URL: {}", asset.secure_url);
                    println!("  Public ID: {}", asset.public_id);
                }
                Err(e) => {
                    error!("❌ {} upload failed: {}", kind.label(), e);
                    std::process::exit(1);
                }
            }
        }
        Command::Delete { public_id } => match client.delete(&public_id).await {
            Ok(true) => println!("{} '{}' deleted successfully.", kind.label(), public_id),
            Ok(false) | Err(_) => {
                println!("Deletion failed for {} '{}'.", kind, public_id);
                std::process::exit(1);
            }
        },
        Command::DeleteByTag { tag, yes } => {
            let confirmation = if yes {
                Confirmation::Confirmed
            } else {
                prompt_confirmation(kind, &tag)?
            };
            match client.delete_by_tag(&tag, confirmation).await {
                Ok(true) => println!("Deletion command sent for {}s tagged '{}'.", kind, tag),
                Ok(false) => println!("No {}s matched the tag '{}'.", kind, tag),
                Err(e) => {
                    println!("{}", e);
                    std::process::exit(1);
                }
            }
        }
        Command::ListByTag { tag } => match client.list_by_tag(&tag).await {
            Ok(urls) if urls.is_empty() => println!("No {}s found with tag '{}'.", kind, tag),
            Ok(urls) => {
                println!("--- {}s tagged with '{}' ---", kind.label(), tag);
                for (i, url) in urls.iter().enumerate() {
                    println!("{}. {}", i + 1, url);
                }
                info!("Found {} URL(s)", urls.len());
            }
            Err(e) => {
                error!("❌ Listing failed: {}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

fn prompt_confirmation(kind: MediaKind, tag: &str) -> io::Result<Confirmation> {
    println!("--- WARNING: Initiating deletion of all {}s with tag: '{}' ---", kind, tag);
    print!(
        "Are you absolutely sure you want to proceed? This action is irreversible. Type '{}' to confirm: ",
        CONFIRMATION_TOKEN
    );
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(Confirmation::parse(answer.trim_end_matches(['\r', '\n'])))
}
