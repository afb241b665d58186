use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;

/// Host user acting on behalf of the bridge.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ServiceAccount {
    pub id: i64,
    pub email: String,
}

#[derive(Debug, Clone)]
/// Fetch the user with `email`, creating it if absent.
pub struct GetOrCreateServiceAccount {
    pub email: String,
}

impl Processor<GetOrCreateServiceAccount> for DatabaseProcessor {
    type Output = ServiceAccount;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetOrCreateServiceAccount")]
    async fn process(
        &self,
        query: GetOrCreateServiceAccount,
    ) -> Result<ServiceAccount, sqlx::Error> {
        sqlx::query_as::<_, ServiceAccount>(
            r#"
            INSERT INTO users (email, is_staff)
            VALUES ($1, TRUE)
            ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
            RETURNING id, email
            "#,
        )
        .bind(query.email)
        .fetch_one(&self.pool)
        .await
    }
}
