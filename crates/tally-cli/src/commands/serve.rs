//! Web server command

use std::path::Path;

use anyhow::Result;
use tally_server::ServerConfig;

use super::open_db;

pub async fn cmd_serve(
    db_path: &Path,
    host: &str,
    port: u16,
    no_encrypt: bool,
    static_dir: Option<&Path>,
) -> Result<()> {
    let db = open_db(db_path, no_encrypt)?;

    println!("🌐 Starting server at http://{}:{}", host, port);

    let static_dir = static_dir.and_then(|p| p.to_str().map(String::from));
    tally_server::serve(
        db,
        host,
        port,
        static_dir.as_deref(),
        ServerConfig::default(),
    )
    .await
}
