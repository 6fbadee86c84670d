//! Per-symbol run serialization

use crate::data::Symbol;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Hands out one lock per symbol; runs for different symbols never contend
#[derive(Debug, Default)]
pub struct RunGate {
    locks: Mutex<HashMap<Symbol, Arc<AsyncMutex<()>>>>,
}

static SHARED: OnceLock<RunGate> = OnceLock::new();

impl RunGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// The gate every pipeline in this process goes through
    pub fn shared() -> &'static RunGate {
        SHARED.get_or_init(RunGate::new)
    }

    /// Wait until no other run holds `symbol`
    pub async fn acquire(&self, symbol: &Symbol) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks
                .entry(symbol.clone())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}
