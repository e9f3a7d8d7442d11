use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};

use storefront_application::AuditTrailRepository;
use storefront_core::{AppError, AppResult};
use storefront_domain::{AuditEntry, AuditLogFilter, NewAuditEntry, Page, PageRequest};

/// PostgreSQL-backed append-only audit trail.
#[derive(Clone)]
pub struct PostgresAuditTrailRepository {
    pool: PgPool,
}

impl PostgresAuditTrailRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AuditEntryRow {
    id: i64,
    subject_email: String,
    action: String,
    performed_by: Option<String>,
    role_name: Option<String>,
    details: String,
    created_at: DateTime<Utc>,
}

impl From<AuditEntryRow> for AuditEntry {
    fn from(row: AuditEntryRow) -> Self {
        Self {
            id: row.id,
            subject_email: row.subject_email,
            action: row.action,
            performed_by: row.performed_by,
            role_name: row.role_name,
            details: row.details,
            timestamp: row.created_at,
        }
    }
}

/// Inserts one audit row on an open connection or transaction.
pub(crate) async fn insert_audit_entry(
    connection: &mut PgConnection,
    entry: &NewAuditEntry,
) -> AppResult<AuditEntry> {
    let row = sqlx::query_as::<_, AuditEntryRow>(
        r#"
        INSERT INTO audit_log_entries (
            subject_email,
            action,
            performed_by,
            role_name,
            details
        )
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, subject_email, action, performed_by, role_name, details, created_at
        "#,
    )
    .bind(entry.subject_email())
    .bind(entry.action())
    .bind(entry.performed_by())
    .bind(entry.role_name())
    .bind(entry.details())
    .fetch_one(connection)
    .await
    .map_err(|error| AppError::Internal(format!("failed to append audit entry: {error}")))?;

    Ok(row.into())
}

#[async_trait]
impl AuditTrailRepository for PostgresAuditTrailRepository {
    async fn append_entry(&self, entry: NewAuditEntry) -> AppResult<AuditEntry> {
        let mut connection = self.pool.acquire().await.map_err(|error| {
            AppError::Internal(format!("failed to acquire audit connection: {error}"))
        })?;

        insert_audit_entry(&mut *connection, &entry).await
    }

    async fn query_entries(
        &self,
        filter: &AuditLogFilter,
        page: PageRequest,
    ) -> AppResult<Page<AuditEntry>> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM audit_log_entries
            WHERE ($1::TEXT IS NULL OR subject_email = $1)
                AND ($2::TEXT IS NULL OR role_name = $2)
                AND ($3::TEXT IS NULL OR action = $3)
                AND ($4::TEXT IS NULL OR details = $4)
                AND ($5::TEXT IS NULL OR performed_by = $5)
                AND ($6::TIMESTAMPTZ IS NULL OR created_at >= $6)
                AND ($7::TIMESTAMPTZ IS NULL OR created_at <= $7)
            "#,
        )
        .bind(filter.subject_email.as_deref())
        .bind(filter.role_name.as_deref())
        .bind(filter.action.as_deref())
        .bind(filter.details.as_deref())
        .bind(filter.performed_by.as_deref())
        .bind(filter.start_time)
        .bind(filter.end_time)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to count audit entries: {error}")))?;

        let limit = i64::from(page.page_size());
        let offset = i64::try_from(page.offset()).map_err(|error| {
            AppError::Validation(format!("audit page offset is out of range: {error}"))
        })?;

        let rows = sqlx::query_as::<_, AuditEntryRow>(
            r#"
            SELECT id, subject_email, action, performed_by, role_name, details, created_at
            FROM audit_log_entries
            WHERE ($1::TEXT IS NULL OR subject_email = $1)
                AND ($2::TEXT IS NULL OR role_name = $2)
                AND ($3::TEXT IS NULL OR action = $3)
                AND ($4::TEXT IS NULL OR details = $4)
                AND ($5::TEXT IS NULL OR performed_by = $5)
                AND ($6::TIMESTAMPTZ IS NULL OR created_at >= $6)
                AND ($7::TIMESTAMPTZ IS NULL OR created_at <= $7)
            ORDER BY created_at ASC, id ASC
            LIMIT $8
            OFFSET $9
            "#,
        )
        .bind(filter.subject_email.as_deref())
        .bind(filter.role_name.as_deref())
        .bind(filter.action.as_deref())
        .bind(filter.details.as_deref())
        .bind(filter.performed_by.as_deref())
        .bind(filter.start_time)
        .bind(filter.end_time)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list audit entries: {error}")))?;

        let total = u64::try_from(total).map_err(|error| {
            AppError::Internal(format!("invalid audit entry count: {error}"))
        })?;

        Ok(Page::new(
            rows.into_iter().map(AuditEntry::from).collect(),
            page,
            total,
        ))
    }
}
