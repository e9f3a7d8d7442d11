use super::*;

impl PostgresAccountRepository {
    pub(super) async fn find_by_id_impl(
        &self,
        account_id: UserId,
    ) -> AppResult<Option<AccountRecord>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT
                accounts.id,
                accounts.email,
                accounts.display_name,
                COALESCE(
                    array_agg(role_types.name ORDER BY role_types.name)
                        FILTER (WHERE role_types.name IS NOT NULL),
                    ARRAY[]::TEXT[]
                ) AS roles
            FROM accounts
            LEFT JOIN account_roles ON account_roles.account_id = accounts.id
            LEFT JOIN role_types ON role_types.id = account_roles.role_type_id
            WHERE accounts.id = $1
            GROUP BY accounts.id
            "#,
        )
        .bind(account_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find account by id: {error}")))?;

        row.map(AccountRecord::try_from).transpose()
    }

    pub(super) async fn find_by_email_impl(
        &self,
        email: &EmailAddress,
    ) -> AppResult<Option<AccountRecord>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT
                accounts.id,
                accounts.email,
                accounts.display_name,
                COALESCE(
                    array_agg(role_types.name ORDER BY role_types.name)
                        FILTER (WHERE role_types.name IS NOT NULL),
                    ARRAY[]::TEXT[]
                ) AS roles
            FROM accounts
            LEFT JOIN account_roles ON account_roles.account_id = accounts.id
            LEFT JOIN role_types ON role_types.id = account_roles.role_type_id
            WHERE accounts.email = $1
            GROUP BY accounts.id
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find account by email: {error}"))
        })?;

        row.map(AccountRecord::try_from).transpose()
    }

    pub(super) async fn ensure_account_impl(
        &self,
        email: &EmailAddress,
        display_name: &str,
    ) -> AppResult<AccountRecord> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to start account transaction: {error}"))
        })?;

        let inserted_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO accounts (id, email, display_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email.as_str())
        .bind(display_name)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to register account: {error}")))?;

        if let Some(account_id) = inserted_id {
            let role_type_id = ensure_role_type(&mut *transaction, RoleType::Buyer).await?;
            sqlx::query(
                r#"
                INSERT INTO account_roles (account_id, role_type_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(account_id)
            .bind(role_type_id)
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to grant default buyer role: {error}"))
            })?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit account transaction: {error}"))
        })?;

        self.find_by_email_impl(email).await?.ok_or_else(|| {
            AppError::Internal(format!(
                "account '{}' vanished after registration",
                email.as_str()
            ))
        })
    }
}
