use diesel::{
    r2d2::{ConnectionManager, Pool},
    PgConnection,
};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::info;

use crate::error::Error;

pub mod models;
pub mod schema;

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub fn create_pool(database_url: &str) -> Result<PgPool, Error> {
    let manager = ConnectionManager::new(database_url);
    Ok(Pool::new(manager)?)
}

pub fn run_migrations(connection: &mut PgConnection) -> Result<(), Error> {
    let versions = connection
        .run_pending_migrations(MIGRATIONS)
        .map_err(|why| Error::MigrationError(why.to_string()))?;

    for version in versions {
        info!("Applied migration {}", version);
    }

    Ok(())
}
