mod sled_user_store;
pub use sled_user_store::*;


use std::path::Path;

use tracing::debug;
use tracing::warn;

/// Opens (or creates) the user database below `sled_db_root_path`.
pub fn init_sled_user_db(
    sled_db_root_path: impl AsRef<Path> + std::fmt::Debug
) -> std::result::Result<sled::Db, std::io::Error> {
    debug!("init_sled_user_db from path: {:?}", &sled_db_root_path);

    let user_db_path = sled_db_root_path.as_ref().join("users");

    sled::Config::default()
        .path(&user_db_path)
        .cache_capacity(256 * 1024 * 1024) //256MB
        .use_compression(true)
        .compression_factor(1)
        .open()
        .map_err(|e| {
            warn!(
                "Try to open DB at this location: {:?} and failed: {:?}",
                user_db_path, e
            );
            std::io::Error::other(e)
        })
}
