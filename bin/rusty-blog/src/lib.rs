//! # Rusty-Blog assembly
//!
//! Wires the compiled-in plugins into the engine. Shared by the server and
//! the `seed` tool.

pub mod settings;

use std::sync::Arc;
#[cfg(feature = "cache-memory")]
use std::time::Duration;

use rb_api::AppState;
use rb_core::traits::PageCache;
use rb_core::{Accounts, Blog};

// Feature-gated imports: the binary is compiled to order.
#[cfg(feature = "db-sqlite")]
use rb_db_sqlite::SqliteBlogRepo;

#[cfg(feature = "storage-local")]
use rb_storage_local::LocalMediaStore;

#[cfg(feature = "auth-simple")]
use rb_auth_simple::SimpleAuthProvider;

#[cfg(feature = "cache-memory")]
use rb_cache_memory::MemoryPageCache;

use settings::Settings;

#[cfg(not(all(feature = "db-sqlite", feature = "storage-local", feature = "auth-simple")))]
compile_error!("rusty-blog needs a database, a media store and an auth provider: enable db-sqlite, storage-local and auth-simple");

pub async fn open_repo(settings: &Settings) -> anyhow::Result<Arc<SqliteBlogRepo>> {
    Ok(Arc::new(SqliteBlogRepo::new(&settings.database_url).await?))
}

pub fn accounts(repo: Arc<SqliteBlogRepo>) -> Accounts {
    Accounts::new(repo, Arc::new(SimpleAuthProvider::new()))
}

#[cfg(feature = "cache-memory")]
fn page_cache(settings: &Settings) -> Arc<dyn PageCache> {
    Arc::new(MemoryPageCache::new(
        Duration::from_secs(settings.cache_ttl_secs),
        settings.cache_capacity,
    ))
}

#[cfg(not(feature = "cache-memory"))]
fn page_cache(_: &Settings) -> Arc<dyn PageCache> {
    Arc::new(rb_core::traits::NoCache)
}

/// Builds the state every worker shares.
pub async fn build_state(settings: &Settings) -> anyhow::Result<AppState> {
    let repo = open_repo(settings).await?;
    let media = Arc::new(LocalMediaStore::new(
        settings.media_root.clone(),
        settings.media_url.clone(),
    ));

    let blog = Blog::new(
        repo.clone(),
        repo.clone(),
        media,
        page_cache(settings),
        settings.blog_settings(),
    );

    Ok(AppState {
        blog,
        accounts: accounts(repo),
        login_url: settings.login_url.clone(),
    })
}
