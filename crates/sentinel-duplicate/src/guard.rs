//! The duplicate-submission guard (distilled §4.5). The audit is ground
//! truth for completed submissions; the active-set only prevents
//! concurrent overlap within a single process run.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use sentinel_audit::{AuditAppend, AuditKind, AuditLog, Outcome, SubjectRef};
use sentinel_types::{ActorId, Details};

use crate::error::DuplicateError;
use crate::key::SubmissionKey;
use crate::lock::KeyLock;

/// Returned by [`DuplicateGuard::check_and_acquire`]. Holds the key whose
/// per-key lock is held until [`DuplicateGuard::verify_and_release`] or
/// [`DuplicateGuard::release_on_error`] is called.
pub struct SubmissionHandle {
    pub key: SubmissionKey,
}

pub struct DuplicateGuard {
    locks: Mutex<HashMap<SubmissionKey, Arc<KeyLock>>>,
    active: Mutex<HashSet<SubmissionKey>>,
}

impl Default for DuplicateGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl DuplicateGuard {
    pub fn new() -> Self {
        Self { locks: Mutex::new(HashMap::new()), active: Mutex::new(HashSet::new()) }
    }

    fn key_lock(&self, key: SubmissionKey) -> Arc<KeyLock> {
        let mut locks = self.locks.lock().expect("lock table poisoned");
        Arc::clone(locks.entry(key).or_insert_with(|| Arc::new(KeyLock::new())))
    }

    /// A `TransmissionPending` record means the external side effect
    /// already fired even though the platform hasn't resolved it yet, so
    /// it counts toward duplicate detection the same as `Transmitted`.
    fn has_transmitted_record(&self, audit: &AuditLog, key: &SubmissionKey) -> usize {
        audit
            .by_kind(|k| matches!(k, AuditKind::Transmitted | AuditKind::TransmissionPending))
            .into_iter()
            .filter(|r| r.references(&key.as_subject_string()))
            .count()
    }

    fn log_duplicate_blocked(
        &self,
        audit: &AuditLog,
        key: &SubmissionKey,
        submitter: &ActorId,
        reason: &str,
    ) -> Result<(), sentinel_audit::AuditError> {
        let mut details = Details::new();
        details.insert("reason".to_string(), reason.into());
        audit
            .append(AuditAppend {
                actor: submitter.clone(),
                kind: AuditKind::DuplicateBlocked,
                outcome: Outcome::Blocked,
                subjects: vec![SubjectRef::Submission(key.as_subject_string())],
                details,
            })
            .map(|_| ())
    }

    /// 1. Acquire the per-key exclusive lock. 2. Under the short global
    /// lock, reject if the key is already active in this process. 3.
    /// Otherwise scan the audit for a prior transmitted record matching
    /// the key. 4. Add the key to the active-set; the handle carries the
    /// still-held per-key lock forward.
    pub fn check_and_acquire(
        &self,
        key: SubmissionKey,
        submitter: &ActorId,
        audit: &AuditLog,
    ) -> Result<SubmissionHandle, DuplicateError> {
        let lock = self.key_lock(key);
        lock.acquire();

        {
            let mut active = self.active.lock().expect("active set poisoned");
            if active.contains(&key) {
                drop(active);
                lock.release();
                tracing::warn!(key = %key, submitter = %submitter.0, reason = "active", "duplicate submission blocked");
                let _ = self.log_duplicate_blocked(audit, &key, submitter, "active");
                return Err(DuplicateError::ActiveDuplicate(key.to_string()));
            }
            active.insert(key);
        }

        if self.has_transmitted_record(audit, &key) > 0 {
            self.active.lock().expect("active set poisoned").remove(&key);
            lock.release();
            tracing::warn!(key = %key, submitter = %submitter.0, reason = "audit", "duplicate submission blocked");
            let _ = self.log_duplicate_blocked(audit, &key, submitter, "audit");
            return Err(DuplicateError::AuditDuplicate(key.to_string()));
        }

        Ok(SubmissionHandle { key })
    }

    /// If `transmitted`, rescan the audit for transmitted-records matching
    /// the key; more than one is a critical, HARD STOP duplicate (the
    /// external side effect may have fired twice). Always releases the
    /// per-key lock and removes the key from the active-set.
    pub fn verify_and_release(
        &self,
        handle: SubmissionHandle,
        submitter: &ActorId,
        transmitted: bool,
        audit: &AuditLog,
    ) -> Result<(), DuplicateError> {
        let key = handle.key;
        let result = if transmitted {
            let count = self.has_transmitted_record(audit, &key);
            if count > 1 {
                tracing::error!(key = %key, count, "critical duplicate: more than one transmitted record for the same key");
                let _ = self.log_duplicate_blocked(audit, &key, submitter, "critical-post-transmission");
                Err(DuplicateError::CriticalDuplicate(key.to_string()))
            } else {
                Ok(())
            }
        } else {
            Ok(())
        };

        self.release_internal(key);
        result
    }

    /// Path for errors before transmission completes: releases without
    /// any audit write for the success path.
    pub fn release_on_error(&self, handle: SubmissionHandle) {
        self.release_internal(handle.key);
    }

    fn release_internal(&self, key: SubmissionKey) {
        self.active.lock().expect("active set poisoned").remove(&key);
        if let Some(lock) = self.locks.lock().expect("lock table poisoned").get(&key) {
            lock.release();
        }
    }
}
