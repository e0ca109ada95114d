//! Creates users and groups against the configured database.
//!
//! ```text
//! seed user <username> <password>
//! seed group <slug> <title> [description]
//! ```

use anyhow::{bail, Context};
use rb_core::models::Group;
use rb_core::traits::BlogRepo;
use rusty_blog::settings::Settings;

const USAGE: &str = "usage: seed user <username> <password> | seed group <slug> <title> [description]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let settings = Settings::load().context("loading configuration")?;
    let repo = rusty_blog::open_repo(&settings).await?;

    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["user", username, password] => {
            let user = rusty_blog::accounts(repo).register(username, password).await?;
            log::info!("created user {} ({})", user.username, user.id);
        }
        ["group", slug, title, rest @ ..] if rest.len() <= 1 => {
            if repo.get_group(slug).await?.is_some() {
                bail!("group {slug} already exists");
            }
            let group = Group::new(slug, title, rest.first().copied().unwrap_or_default());
            repo.create_group(group.clone()).await?;
            log::info!("created group {} ({})", group.slug, group.id);
        }
        _ => bail!(USAGE),
    }
    Ok(())
}
