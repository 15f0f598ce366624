//! Transaction scope spanning both repositories.
//!
//! ```ignore
//! let uow = UnitOfWork::new(db.clone());
//! let food_id = uow
//!     .execute(move |uow| {
//!         Box::pin(async move {
//!             uow.foods().save(&food).await?;
//!             uow.pantry_items().save(&item).await?;
//!             Ok(food.id().to_string())
//!         })
//!     })
//!     .await?;
//! ```

use futures::future::BoxFuture;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{Database, FoodRepository, PantryItemRepository};
use crate::error::{PantryError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Idle,
    InTransaction,
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionState::Idle => write!(f, "idle"),
            TransactionState::InTransaction => write!(f, "in transaction"),
        }
    }
}

/// Runs work against the repositories inside one transaction.
///
/// One transaction at a time per instance. Callers that share an instance
/// across tasks must serialize their `execute` calls themselves.
pub struct UnitOfWork {
    db: Arc<Database>,
    foods: FoodRepository,
    pantry_items: PantryItemRepository,
    active: AtomicBool,
}

impl UnitOfWork {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            foods: FoodRepository::new(db.clone()),
            pantry_items: PantryItemRepository::new(db.clone()),
            db,
            active: AtomicBool::new(false),
        }
    }

    pub fn foods(&self) -> &FoodRepository {
        &self.foods
    }

    pub fn pantry_items(&self) -> &PantryItemRepository {
        &self.pantry_items
    }

    pub fn state(&self) -> TransactionState {
        if self.active.load(Ordering::SeqCst) {
            TransactionState::InTransaction
        } else {
            TransactionState::Idle
        }
    }

    pub async fn begin_transaction(&self) -> Result<()> {
        if self.active.swap(true, Ordering::SeqCst) {
            return Err(PantryError::TransactionState(
                "a transaction is already in progress".to_string(),
            ));
        }
        if let Err(e) = self.db.begin_transaction().await {
            self.active.store(false, Ordering::SeqCst);
            return Err(e);
        }
        tracing::info!("transaction started");
        Ok(())
    }

    /// Commit the open transaction. If the commit itself fails the unit of
    /// work stays in transaction so the caller can still roll back.
    pub async fn commit(&self) -> Result<()> {
        self.require_active("commit")?;
        self.db.commit().await?;
        self.active.store(false, Ordering::SeqCst);
        tracing::info!("transaction committed");
        Ok(())
    }

    pub async fn rollback(&self) -> Result<()> {
        self.require_active("rollback")?;
        let result = self.db.rollback().await;
        self.active.store(false, Ordering::SeqCst);
        result?;
        tracing::info!("transaction rolled back");
        Ok(())
    }

    /// Run `work` in a transaction: commit when it succeeds, otherwise roll
    /// back and return its error unchanged.
    pub async fn execute<F, T>(&self, work: F) -> Result<T>
    where
        F: for<'a> FnOnce(&'a UnitOfWork) -> BoxFuture<'a, Result<T>>,
    {
        self.begin_transaction().await?;

        match work(self).await {
            Ok(value) => {
                if let Err(commit_err) = self.commit().await {
                    self.rollback_after_failure(&commit_err).await;
                    return Err(commit_err);
                }
                Ok(value)
            }
            Err(err) => {
                self.rollback_after_failure(&err).await;
                Err(err)
            }
        }
    }

    async fn rollback_after_failure(&self, cause: &PantryError) {
        tracing::warn!(error = %cause, "unit of work failed, rolling back");
        if let Err(rollback_err) = self.rollback().await {
            tracing::error!(
                error = %rollback_err,
                cause = %cause,
                "rollback failed after unit of work error"
            );
        }
    }

    fn require_active(&self, operation: &str) -> Result<()> {
        if self.active.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(PantryError::TransactionState(format!(
                "cannot {} without an active transaction",
                operation
            )))
        }
    }
}
