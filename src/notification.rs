//! One-shot save notification that survives a page reload.
//!
//! A mutating request records its [`Outcome`] in the session store. The next
//! page load calls [`NotificationStore::consume_and_clear`], which shows one
//! toast for the stored outcome and removes it so it is never shown twice.

use crate::session::SessionStore;
use anyhow::{Context, Result};
use log::{debug, error, info, warn};
#[cfg(any(test, feature = "mock"))]
use mockall::automock;
use std::{fmt, str::FromStr};

/// Session key holding the pending notification.
pub const NOTIFICATION_KEY: &str = "Notification";

/// Success or failure of a mutating request.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Outcome {
    Ok,
    Err,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::Err => "err",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ok" => Ok(Outcome::Ok),
            "err" => Ok(Outcome::Err),
            other => anyhow::bail!("failed to parse outcome: unknown value {other:?}"),
        }
    }
}

/// Observable state of the notification slot.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NotificationSlot {
    Unset,
    Ok,
    Err,
}

impl From<Outcome> for NotificationSlot {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Ok => NotificationSlot::Ok,
            Outcome::Err => NotificationSlot::Err,
        }
    }
}

/// Arguments of a transient toast message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Toast {
    pub kind: &'static str,
    pub message: &'static str,
    pub position: &'static str,
    pub color_hex: &'static str,
    pub severity: &'static str,
    pub duration_ms: u32,
    pub count: u32,
    pub animation: &'static str,
}

impl Toast {
    pub const SAVE_OK: Toast = Toast {
        kind: "info",
        message: "save ok .",
        position: "top-center",
        color_hex: "#1ea69a",
        severity: "info",
        duration_ms: 2000,
        count: 1,
        animation: "slide",
    };

    pub const SAVE_ERR: Toast = Toast {
        kind: "info",
        message: "save err.",
        position: "top-center",
        color_hex: "#1ea69a",
        severity: "error",
        duration_ms: 2000,
        count: 1,
        animation: "slide",
    };

    pub fn for_outcome(outcome: Outcome) -> &'static Toast {
        match outcome {
            Outcome::Ok => &Self::SAVE_OK,
            Outcome::Err => &Self::SAVE_ERR,
        }
    }
}

/// Shows toasts to the user.
#[cfg_attr(any(test, feature = "mock"), automock)]
pub trait Toaster {
    fn send(&self, toast: &Toast);
}

/// Toaster writing each toast to the log, for headless consoles.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogToaster;

impl Toaster for LogToaster {
    fn send(&self, toast: &Toast) {
        if toast.severity == "error" {
            error!("{}", toast.message);
        } else {
            info!("{}", toast.message);
        }
    }
}

/// The notification slot on top of a session store.
pub struct NotificationStore<S> {
    session: S,
}

impl<S: SessionStore> NotificationStore<S> {
    pub fn new(session: S) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// Store `outcome`, replacing whatever was pending.
    pub fn record_outcome(&self, outcome: Outcome) -> Result<()> {
        debug!("record_outcome() called with {outcome}");
        self.session
            .set(NOTIFICATION_KEY, outcome.as_str())
            .context("failed to record notification outcome")
    }

    /// Current slot state without consuming it.
    pub fn peek(&self) -> NotificationSlot {
        self.session
            .get(NOTIFICATION_KEY)
            .and_then(|value| value.parse::<Outcome>().ok())
            .map_or(NotificationSlot::Unset, NotificationSlot::from)
    }

    /// Show the pending notification once and clear the slot.
    ///
    /// Returns what was pending. The key is removed even if it held no
    /// recognised outcome, so a second call never shows anything.
    pub fn consume_and_clear<T: Toaster + ?Sized>(&self, toaster: &T) -> NotificationSlot {
        let slot = match self.session.get(NOTIFICATION_KEY) {
            Some(value) => match value.parse::<Outcome>() {
                Ok(outcome) => {
                    toaster.send(Toast::for_outcome(outcome));
                    outcome.into()
                }
                Err(e) => {
                    warn!("ignoring pending notification: {e:#}");
                    NotificationSlot::Unset
                }
            },
            None => NotificationSlot::Unset,
        };

        if let Err(e) = self.session.remove(NOTIFICATION_KEY) {
            error!("failed to clear notification: {e:#}");
        }

        slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemorySessionStore, MockSessionStore};
    use mockall::predicate::eq;

    mod outcome {
        use super::*;

        #[test]
        fn parses_stored_values() {
            assert_eq!("ok".parse::<Outcome>().unwrap(), Outcome::Ok);
            assert_eq!("err".parse::<Outcome>().unwrap(), Outcome::Err);
            assert!("OK".parse::<Outcome>().is_err());
            assert!("".parse::<Outcome>().is_err());
        }

        #[test]
        fn toast_literals_match_outcome() {
            let ok = Toast::for_outcome(Outcome::Ok);
            assert_eq!(ok.message, "save ok .");
            assert_eq!(ok.severity, "info");

            let err = Toast::for_outcome(Outcome::Err);
            assert_eq!(err.message, "save err.");
            assert_eq!(err.severity, "error");

            for toast in [ok, err] {
                assert_eq!(toast.kind, "info");
                assert_eq!(toast.position, "top-center");
                assert_eq!(toast.color_hex, "#1ea69a");
                assert_eq!(toast.duration_ms, 2000);
                assert_eq!(toast.count, 1);
                assert_eq!(toast.animation, "slide");
            }
        }
    }

    mod consume {
        use super::*;

        #[test]
        fn ok_shows_one_success_toast_and_clears() {
            let store = NotificationStore::new(MemorySessionStore::new());
            store.record_outcome(Outcome::Ok).unwrap();
            assert_eq!(store.peek(), NotificationSlot::Ok);

            let mut toaster = MockToaster::new();
            toaster
                .expect_send()
                .with(eq(Toast::SAVE_OK))
                .times(1)
                .return_const(());

            assert_eq!(store.consume_and_clear(&toaster), NotificationSlot::Ok);
            assert_eq!(store.session().get(NOTIFICATION_KEY), None);
            assert_eq!(store.peek(), NotificationSlot::Unset);
        }

        #[test]
        fn second_consume_is_a_no_op() {
            let store = NotificationStore::new(MemorySessionStore::new());
            store.record_outcome(Outcome::Err).unwrap();

            let mut toaster = MockToaster::new();
            toaster
                .expect_send()
                .with(eq(Toast::SAVE_ERR))
                .times(1)
                .return_const(());

            assert_eq!(store.consume_and_clear(&toaster), NotificationSlot::Err);
            assert_eq!(store.consume_and_clear(&toaster), NotificationSlot::Unset);
        }

        #[test]
        fn latest_outcome_overwrites_earlier_one() {
            let store = NotificationStore::new(MemorySessionStore::new());
            store.record_outcome(Outcome::Err).unwrap();
            store.record_outcome(Outcome::Ok).unwrap();

            let mut toaster = MockToaster::new();
            toaster
                .expect_send()
                .with(eq(Toast::SAVE_OK))
                .times(1)
                .return_const(());

            assert_eq!(store.consume_and_clear(&toaster), NotificationSlot::Ok);
        }

        #[test]
        fn unknown_value_is_cleared_without_toast() {
            let session = MemorySessionStore::new();
            session.set(NOTIFICATION_KEY, "maybe").unwrap();
            let store = NotificationStore::new(session);

            let mut toaster = MockToaster::new();
            toaster.expect_send().never();

            assert_eq!(store.consume_and_clear(&toaster), NotificationSlot::Unset);
            assert_eq!(store.session().get(NOTIFICATION_KEY), None);
        }

        #[test]
        fn removes_key_even_when_unset() {
            let mut session = MockSessionStore::new();
            session
                .expect_get()
                .with(eq(NOTIFICATION_KEY))
                .times(1)
                .return_const(None::<String>);
            session
                .expect_remove()
                .with(eq(NOTIFICATION_KEY))
                .times(1)
                .returning(|_| Ok(()));
            let store = NotificationStore::new(session);

            let mut toaster = MockToaster::new();
            toaster.expect_send().never();

            assert_eq!(store.consume_and_clear(&toaster), NotificationSlot::Unset);
        }

        #[test]
        fn failed_removal_still_reports_pending_outcome() {
            let mut session = MockSessionStore::new();
            session
                .expect_get()
                .return_const(Some("ok".to_string()));
            session
                .expect_remove()
                .returning(|_| Err(anyhow::anyhow!("read-only session")));
            let store = NotificationStore::new(session);

            let mut toaster = MockToaster::new();
            toaster.expect_send().times(1).return_const(());

            assert_eq!(store.consume_and_clear(&toaster), NotificationSlot::Ok);
        }
    }

    mod record {
        use super::*;

        #[test]
        fn writes_wire_value_under_notification_key() {
            let mut session = MockSessionStore::new();
            session
                .expect_set()
                .with(eq(NOTIFICATION_KEY), eq("err"))
                .times(1)
                .returning(|_, _| Ok(()));

            NotificationStore::new(session)
                .record_outcome(Outcome::Err)
                .unwrap();
        }

        #[test]
        fn propagates_storage_failure() {
            let mut session = MockSessionStore::new();
            session
                .expect_set()
                .returning(|_, _| Err(anyhow::anyhow!("disk full")));

            let err = NotificationStore::new(session)
                .record_outcome(Outcome::Ok)
                .unwrap_err();
            assert!(err.to_string().contains("failed to record notification outcome"));
        }
    }
}
