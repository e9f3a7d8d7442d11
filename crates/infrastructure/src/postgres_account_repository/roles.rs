use super::*;

impl PostgresAccountRepository {
    pub(super) async fn grant_role_impl(
        &self,
        change: RoleChange,
    ) -> AppResult<RoleChangeOutcome> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to start role grant transaction: {error}"))
        })?;

        let role_type_id = ensure_role_type(&mut *transaction, change.role).await?;
        let inserted = sqlx::query(
            r#"
            INSERT INTO account_roles (account_id, role_type_id)
            VALUES ($1, $2)
            ON CONFLICT (account_id, role_type_id) DO NOTHING
            "#,
        )
        .bind(change.account_id.as_uuid())
        .bind(role_type_id)
        .execute(&mut *transaction)
        .await
        .map_err(|error| membership_error(error, change.account_id, "grant"))?;

        if inserted.rows_affected() == 0 {
            transaction.rollback().await.map_err(|error| {
                AppError::Internal(format!("failed to roll back role grant: {error}"))
            })?;
            return Ok(RoleChangeOutcome::Unchanged);
        }

        insert_audit_entry(&mut *transaction, &change.audit_entry).await?;
        let follow_ups = enqueue_follow_ups(&mut *transaction, change.follow_ups).await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit role grant: {error}"))
        })?;

        Ok(RoleChangeOutcome::Applied { follow_ups })
    }

    pub(super) async fn revoke_role_impl(
        &self,
        change: RoleChange,
    ) -> AppResult<RoleChangeOutcome> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to start role revoke transaction: {error}"))
        })?;

        let deleted = sqlx::query(
            r#"
            DELETE FROM account_roles
            USING role_types
            WHERE account_roles.role_type_id = role_types.id
              AND account_roles.account_id = $1
              AND role_types.name = $2
            "#,
        )
        .bind(change.account_id.as_uuid())
        .bind(change.role.as_str())
        .execute(&mut *transaction)
        .await
        .map_err(|error| membership_error(error, change.account_id, "revoke"))?;

        if deleted.rows_affected() == 0 {
            transaction.rollback().await.map_err(|error| {
                AppError::Internal(format!("failed to roll back role revoke: {error}"))
            })?;
            return Ok(RoleChangeOutcome::Unchanged);
        }

        insert_audit_entry(&mut *transaction, &change.audit_entry).await?;
        let follow_ups = enqueue_follow_ups(&mut *transaction, change.follow_ups).await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit role revoke: {error}"))
        })?;

        Ok(RoleChangeOutcome::Applied { follow_ups })
    }
}

fn membership_error(error: sqlx::Error, account_id: UserId, operation: &str) -> AppError {
    if let sqlx::Error::Database(ref database_error) = error
        && database_error.code().as_deref() == Some("23503")
    {
        return AppError::NotFound(format!("account '{account_id}' not found"));
    }

    AppError::Internal(format!("failed to {operation} role membership: {error}"))
}
