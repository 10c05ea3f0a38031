use anyhow::Result;
use futures::future::BoxFuture;

/// Brands seeded at setup time, as `(brand_name, prefix)`.
pub const DEFAULT_BRANDS: &[(&str, &str)] = &[
    ("Chauvet", "CHV"),
    ("ADJ", "ADJ"),
    ("Elation", "ELA"),
    ("Martin", "MAR"),
    ("Shure", "SHU"),
    ("Sennheiser", "SEN"),
    ("Yamaha", "YAM"),
    ("QSC", "QSC"),
    ("Behringer", "BEH"),
    ("Generic", "GEN"),
];

pub trait CatalogMigrations {
    type Pool;

    fn ensure_migrations_table(pool: &Self::Pool) -> BoxFuture<'_, Result<()>>;
    fn current_version(pool: &Self::Pool) -> BoxFuture<'_, Result<i64>>;
    fn record_version(pool: &Self::Pool, version: i64) -> BoxFuture<'_, Result<()>>;

    /// Sequence, settings and reference-data tables.
    fn migrate_v1(pool: &Self::Pool) -> BoxFuture<'_, Result<()>>;
    /// Default brand set.
    fn migrate_v2(pool: &Self::Pool) -> BoxFuture<'_, Result<()>>;
}

pub async fn run_migrations<M: CatalogMigrations>(pool: &M::Pool) -> Result<()> {
    M::ensure_migrations_table(pool).await?;

    let mut current_version = M::current_version(pool).await?;
    let steps: &[(i64, for<'a> fn(&'a M::Pool) -> BoxFuture<'a, Result<()>>)] =
        &[(1, M::migrate_v1), (2, M::migrate_v2)];

    for (version, apply) in steps {
        if current_version < *version {
            tracing::info!(version, "Applying catalog migration");
            apply(pool).await?;
            M::record_version(pool, *version).await?;
            current_version = *version;
        }
    }

    Ok(())
}
