//! Cancellation and deadlines for read queries.
//!
//! A [`QueryContext`] travels with every store read. When its token is
//! cancelled or its deadline passes, the in-flight query future is dropped,
//! which returns the connection to the pool and abandons the statement.
//!
//! Reads run inside the caller's future, so a caller that is itself dropped
//! (axum drops the handler when the client disconnects) abandons them too.

use std::{future::Future, time::Duration};

use tokio_util::sync::CancellationToken;

use crate::StoreError;

#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    token: CancellationToken,
    timeout: Option<Duration>,
}

impl QueryContext {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            token: CancellationToken::new(),
            timeout,
        }
    }

    /// Context without a deadline that is never cancelled unless asked to.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_token(token: CancellationToken, timeout: Option<Duration>) -> Self {
        Self { token, timeout }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Drive `fut` to completion unless the context is cancelled or the
    /// deadline passes first.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        if self.token.is_cancelled() {
            return Err(StoreError::Cancelled);
        }

        let bounded = async {
            match self.timeout {
                Some(limit) => tokio::time::timeout(limit, fut)
                    .await
                    .map_err(|_| StoreError::Timeout(limit))?
                    .map_err(StoreError::from),
                None => fut.await.map_err(StoreError::from),
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(StoreError::Cancelled),
            result = bounded => result,
        }
    }
}
