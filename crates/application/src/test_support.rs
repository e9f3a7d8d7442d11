//! In-memory fakes shared by the service tests.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use storefront_core::{AppError, AppResult, UserIdentity};
use storefront_domain::{
    AuditEntry, AuditLogFilter, EmailAddress, FOLLOW_UP_MAX_ATTEMPTS, FollowUpFailure,
    FollowUpJob, FollowUpStatus, NewAuditEntry, Page, PageRequest, RoleType, UserId,
};

use crate::{
    AccountRecord, AccountRepository, AuditTrailRepository, EmailService,
    FollowUpQueueRepository, RefreshTokenRepository, RoleChange, RoleChangeOutcome,
};

#[derive(Debug, Clone)]
pub struct StoredRefreshToken {
    pub account_id: UserId,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
}

#[derive(Debug, Clone)]
pub struct QueuedFollowUp {
    pub job: FollowUpJob,
    pub status: FollowUpStatus,
    pub last_error: Option<String>,
}

#[derive(Default)]
pub struct StoreState {
    pub accounts: HashMap<UserId, AccountRecord>,
    pub audit_entries: Vec<AuditEntry>,
    pub follow_ups: Vec<QueuedFollowUp>,
    pub refresh_tokens: Vec<StoredRefreshToken>,
    pub fail_writes: bool,
    next_audit_id: i64,
}

impl StoreState {
    fn append_audit(&mut self, entry: NewAuditEntry) -> AuditEntry {
        self.next_audit_id += 1;
        let stored = entry.into_entry(self.next_audit_id, Utc::now());
        self.audit_entries.push(stored.clone());
        stored
    }
}

/// Single in-memory store backing every account-side port.
#[derive(Default)]
pub struct InMemoryStore {
    pub state: Mutex<StoreState>,
}

impl InMemoryStore {
    pub async fn insert_account(&self, email: &str, roles: &[RoleType]) -> UserIdentity {
        let email = EmailAddress::new(email).unwrap_or_else(|_| panic!("test"));
        let account = AccountRecord {
            id: UserId::new(),
            email: email.clone(),
            display_name: email.as_str().to_owned(),
            roles: roles.iter().copied().collect::<BTreeSet<_>>(),
        };
        let identity = UserIdentity::new(account.id.as_uuid(), email.as_str(), email.as_str());
        self.state.lock().await.accounts.insert(account.id, account);
        identity
    }

    pub async fn insert_refresh_token(
        &self,
        account_id: Uuid,
        expires_at: DateTime<Utc>,
        revoked: bool,
    ) {
        self.state.lock().await.refresh_tokens.push(StoredRefreshToken {
            account_id: UserId::from_uuid(account_id),
            expires_at,
            revoked,
        });
    }

    pub async fn roles_of(&self, account_id: Uuid) -> BTreeSet<RoleType> {
        self.state
            .lock()
            .await
            .accounts
            .get(&UserId::from_uuid(account_id))
            .map(|account| account.roles.clone())
            .unwrap_or_default()
    }

    pub async fn refresh_token_count(&self, account_id: Uuid) -> usize {
        self.state
            .lock()
            .await
            .refresh_tokens
            .iter()
            .filter(|token| token.account_id.as_uuid() == account_id)
            .count()
    }

    pub async fn follow_up_statuses(&self) -> Vec<FollowUpStatus> {
        self.state
            .lock()
            .await
            .follow_ups
            .iter()
            .map(|queued| queued.status)
            .collect()
    }

    async fn apply_change(
        &self,
        change: RoleChange,
        grant: bool,
    ) -> AppResult<RoleChangeOutcome> {
        let mut state = self.state.lock().await;
        if state.fail_writes {
            return Err(AppError::Internal("connection reset by peer".to_owned()));
        }

        let account = state.accounts.get_mut(&change.account_id).ok_or_else(|| {
            AppError::NotFound(format!("account '{}' not found", change.account_id))
        })?;

        let changed = if grant {
            account.roles.insert(change.role)
        } else {
            account.roles.remove(&change.role)
        };
        if !changed {
            return Ok(RoleChangeOutcome::Unchanged);
        }

        state.append_audit(change.audit_entry);
        let jobs: Vec<FollowUpJob> = change
            .follow_ups
            .into_iter()
            .map(|task| FollowUpJob {
                id: Uuid::new_v4(),
                task,
                attempt_count: 0,
                max_attempts: FOLLOW_UP_MAX_ATTEMPTS,
            })
            .collect();
        state.follow_ups.extend(jobs.iter().cloned().map(|job| QueuedFollowUp {
            job,
            status: FollowUpStatus::Processing,
            last_error: None,
        }));

        Ok(RoleChangeOutcome::Applied { follow_ups: jobs })
    }
}

#[async_trait]
impl AccountRepository for InMemoryStore {
    async fn find_by_id(&self, account_id: UserId) -> AppResult<Option<AccountRecord>> {
        Ok(self.state.lock().await.accounts.get(&account_id).cloned())
    }

    async fn find_by_email(&self, email: &EmailAddress) -> AppResult<Option<AccountRecord>> {
        Ok(self
            .state
            .lock()
            .await
            .accounts
            .values()
            .find(|account| &account.email == email)
            .cloned())
    }

    async fn ensure_account(
        &self,
        email: &EmailAddress,
        display_name: &str,
    ) -> AppResult<AccountRecord> {
        let mut state = self.state.lock().await;
        if let Some(account) = state.accounts.values().find(|account| &account.email == email) {
            return Ok(account.clone());
        }

        let account = AccountRecord {
            id: UserId::new(),
            email: email.clone(),
            display_name: display_name.to_owned(),
            roles: BTreeSet::from([RoleType::Buyer]),
        };
        state.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn grant_role(&self, change: RoleChange) -> AppResult<RoleChangeOutcome> {
        self.apply_change(change, true).await
    }

    async fn revoke_role(&self, change: RoleChange) -> AppResult<RoleChangeOutcome> {
        self.apply_change(change, false).await
    }
}

#[async_trait]
impl AuditTrailRepository for InMemoryStore {
    async fn append_entry(&self, entry: NewAuditEntry) -> AppResult<AuditEntry> {
        let mut state = self.state.lock().await;
        if state.fail_writes {
            return Err(AppError::Internal("disk full".to_owned()));
        }

        Ok(state.append_audit(entry))
    }

    async fn query_entries(
        &self,
        filter: &AuditLogFilter,
        page: PageRequest,
    ) -> AppResult<Page<AuditEntry>> {
        let state = self.state.lock().await;
        let mut matching: Vec<AuditEntry> = state
            .audit_entries
            .iter()
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect();
        matching.sort_by_key(|entry| (entry.timestamp, entry.id));
        Ok(Page::from_ordered(matching, page))
    }
}

#[async_trait]
impl RefreshTokenRepository for InMemoryStore {
    async fn delete_for_account(&self, account_id: UserId) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.refresh_tokens.len();
        state
            .refresh_tokens
            .retain(|token| token.account_id != account_id);
        Ok((before - state.refresh_tokens.len()) as u64)
    }

    async fn delete_expired_or_revoked(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        if state.fail_writes {
            return Err(AppError::Internal("connection refused".to_owned()));
        }

        let before = state.refresh_tokens.len();
        state
            .refresh_tokens
            .retain(|token| !token.revoked && token.expires_at >= now);
        Ok((before - state.refresh_tokens.len()) as u64)
    }
}

#[async_trait]
impl FollowUpQueueRepository for InMemoryStore {
    async fn claim_due(&self, limit: usize) -> AppResult<Vec<FollowUpJob>> {
        let mut state = self.state.lock().await;
        let mut claimed = Vec::new();
        for queued in state
            .follow_ups
            .iter_mut()
            .filter(|queued| queued.status == FollowUpStatus::Pending)
            .take(limit)
        {
            queued.status = FollowUpStatus::Processing;
            claimed.push(queued.job.clone());
        }

        Ok(claimed)
    }

    async fn mark_completed(&self, job_id: Uuid) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some(queued) = state.follow_ups.iter_mut().find(|queued| queued.job.id == job_id) {
            queued.status = FollowUpStatus::Completed;
        }
        Ok(())
    }

    async fn mark_failed(
        &self,
        job_id: Uuid,
        failure: FollowUpFailure,
        error_message: &str,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some(queued) = state.follow_ups.iter_mut().find(|queued| queued.job.id == job_id) {
            queued.status = failure.status;
            queued.job.attempt_count = failure.attempt_count;
            queued.last_error = Some(error_message.to_owned());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub text_body: String,
}

/// Email fake that records messages or fails on demand.
#[derive(Default)]
pub struct RecordingEmailService {
    pub sent: Mutex<Vec<SentEmail>>,
    pub failing: Mutex<bool>,
}

impl RecordingEmailService {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: Mutex::new(true),
        }
    }
}

#[async_trait]
impl EmailService for RecordingEmailService {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        _html_body: Option<&str>,
    ) -> AppResult<()> {
        if *self.failing.lock().await {
            return Err(AppError::ExternalService("smtp relay timed out".to_owned()));
        }

        self.sent.lock().await.push(SentEmail {
            to: to.to_owned(),
            subject: subject.to_owned(),
            text_body: text_body.to_owned(),
        });
        Ok(())
    }
}
