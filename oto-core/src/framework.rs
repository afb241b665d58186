use sqlx::PgPool;

/// Runs the `Processor` queries in [`crate::entities`] against a pool.
#[derive(Debug, Clone)]
pub struct DatabaseProcessor {
    pub pool: PgPool,
}
