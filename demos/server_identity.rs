//! Creates (or reuses) an anonymous server identity from a file-backed store
//! and builds a rustls server configuration from it.
//!
//! Run with:
//! ```bash
//! cargo run --example server_identity
//! ```
//! Running it twice prints the same fingerprint: the stored identity is
//! reused until it expires or is deleted.

use anonid::{tls, AccessPolicy, FileCredentialStore, IdentityManager, DEFAULT_EXPIRATION};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Ignore the error if a process-wide crypto provider is already installed.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let store_dir = std::env::temp_dir().join("anonid-demo");
    let store = FileCredentialStore::new(&store_dir)?;
    let manager = IdentityManager::new(store);

    let identity = manager.get_or_create(
        "sync-server",
        DEFAULT_EXPIRATION,
        Some(AccessPolicy::WhenUnlocked),
    )?;

    println!("store:       {}", store_dir.display());
    println!("label:       {}", identity.label());
    println!("fingerprint: {}", identity.fingerprint());
    println!("not_after:   {:?}", identity.not_after());

    let _config = tls::server_config(&identity)?;
    println!("rustls server config ready");
    Ok(())
}
