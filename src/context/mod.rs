//! Injected runtime context.
//!
//! The timer, reconciler and settings never look up the signed-in user or
//! the current date on their own. They receive these handles at
//! construction instead:
//! - [`CurrentUser`]: the authenticated identity, shared and observable
//! - [`Clock`]: today's local calendar date

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use chrono::{Datelike, Local, NaiveDate};
use tokio::sync::watch;

use crate::types::UserId;

// ============================================================================
// CurrentUser
// ============================================================================

/// Shared handle to the signed-in user, if any.
///
/// Clones observe the same identity. Dependents can `subscribe()` to react
/// to sign-in and sign-out.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    tx: Arc<watch::Sender<Option<UserId>>>,
}

impl CurrentUser {
    pub fn new(user: Option<UserId>) -> Self {
        let (tx, _rx) = watch::channel(user);
        Self { tx: Arc::new(tx) }
    }

    /// Creates a handle with nobody signed in.
    pub fn signed_out() -> Self {
        Self::new(None)
    }

    /// Returns the current identity.
    pub fn get(&self) -> Option<UserId> {
        self.tx.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Replaces the identity. Returns true if it changed.
    pub fn set(&self, user: Option<UserId>) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == user {
                false
            } else {
                *current = user;
                true
            }
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<UserId>> {
        self.tx.subscribe()
    }
}

impl Default for CurrentUser {
    fn default() -> Self {
        Self::signed_out()
    }
}

// ============================================================================
// Clock
// ============================================================================

/// Source of today's local calendar date.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Clock backed by the system's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to a settable date, for tests and replays.
#[derive(Debug)]
pub struct FixedClock {
    days_from_ce: AtomicI32,
}

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            days_from_ce: AtomicI32::new(date.num_days_from_ce()),
        }
    }

    pub fn set(&self, date: NaiveDate) {
        self.days_from_ce
            .store(date.num_days_from_ce(), Ordering::SeqCst);
    }

    /// Moves the date forward by one day.
    pub fn advance_day(&self) {
        self.days_from_ce.fetch_add(1, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        NaiveDate::from_num_days_from_ce_opt(self.days_from_ce.load(Ordering::SeqCst))
            .unwrap_or_default()
    }
}
