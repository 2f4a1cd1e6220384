//! Transaction-scoped sessions.
//!
//! Every request performs its reads and writes through exactly one
//! [`Session`]. Use [`Database::unit_of_work`] rather than managing the
//! session by hand: it commits when the work returns `Ok`, rolls back and
//! hands back the original error otherwise.
//!
//! A session that is dropped without being committed (early return, panic,
//! or the request future being cancelled) rolls back when its connection is
//! returned to the pool, so no partial write is ever observable.

use futures_util::future::BoxFuture;
use him_common::error::HimResult;
use sqlx::AnyConnection;
use sqlx::{Any, Transaction};
use std::ops::{Deref, DerefMut};

use crate::Database;

pub struct Session {
    tx: Transaction<'static, Any>,
}

impl Session {
    pub async fn commit(self) -> Result<(), sqlx::Error> {
        self.tx.commit().await
    }

    pub async fn rollback(self) -> Result<(), sqlx::Error> {
        self.tx.rollback().await
    }
}

impl Deref for Session {
    type Target = AnyConnection;

    fn deref(&self) -> &AnyConnection {
        &self.tx
    }
}

impl DerefMut for Session {
    fn deref_mut(&mut self) -> &mut AnyConnection {
        &mut self.tx
    }
}

impl Database {
    /// Open a session on a pooled connection.
    pub async fn begin(&self) -> Result<Session, sqlx::Error> {
        let tx = self.pool.begin().await?;
        Ok(Session { tx })
    }

    /// Run `work` inside one session.
    ///
    /// `Ok` commits. `Err` rolls back and returns the error unchanged; a
    /// failed rollback is logged but never masks the original error.
    pub async fn unit_of_work<T, F>(&self, work: F) -> HimResult<T>
    where
        T: Send,
        F: for<'s> FnOnce(&'s mut Session) -> BoxFuture<'s, HimResult<T>>,
    {
        let mut session = self.begin().await?;

        match work(&mut session).await {
            Ok(value) => {
                session.commit().await?;
                Ok(value)
            }
            Err(err) => {
                tracing::debug!(error = %err, "Unit of work failed, rolling back");
                if let Err(rollback_err) = session.rollback().await {
                    tracing::warn!(error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }
}
