//! In-memory storage implementation for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::traits::*;
use crate::types::*;

/// In-memory storage implementation for testing and development
#[derive(Debug, Clone)]
pub struct MemoryStore {
    transactions: Arc<RwLock<HashMap<String, Vec<BankTransaction>>>>,
    batch_stats: Arc<RwLock<HashMap<String, Vec<BatchStat>>>>,
}

impl MemoryStore {
    /// Create a new memory store instance
    pub fn new() -> Self {
        Self {
            transactions: Arc::new(RwLock::new(HashMap::new())),
            batch_stats: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        self.transactions.write().unwrap().clear();
        self.batch_stats.write().unwrap().clear();
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReconcileStore for MemoryStore {
    async fn load_transactions(&self, company_id: &str) -> ReconcileResult<Vec<BankTransaction>> {
        Ok(self
            .transactions
            .read()
            .unwrap()
            .get(company_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_transactions(
        &mut self,
        company_id: &str,
        txns: &[BankTransaction],
    ) -> ReconcileResult<()> {
        self.transactions
            .write()
            .unwrap()
            .insert(company_id.to_string(), txns.to_vec());
        Ok(())
    }

    async fn load_batch_stats(&self, company_id: &str) -> ReconcileResult<Vec<BatchStat>> {
        Ok(self
            .batch_stats
            .read()
            .unwrap()
            .get(company_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_batch_stats(
        &mut self,
        company_id: &str,
        stats: &[BatchStat],
    ) -> ReconcileResult<()> {
        self.batch_stats
            .write()
            .unwrap()
            .insert(company_id.to_string(), stats.to_vec());
        Ok(())
    }
}
