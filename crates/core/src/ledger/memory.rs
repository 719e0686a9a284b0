use crate::domain::transaction::TransactionRecord;
use crate::ledger::Ledger;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable snapshot of a ledger export, grouped by user. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    by_user: Arc<HashMap<i64, Vec<TransactionRecord>>>,
}

impl InMemoryLedger {
    /// Groups `records` by user, keeping source order within each user.
    pub fn new(records: Vec<TransactionRecord>) -> Self {
        let mut by_user: HashMap<i64, Vec<TransactionRecord>> = HashMap::new();
        for r in records {
            by_user.entry(r.user_id).or_default().push(r);
        }
        Self {
            by_user: Arc::new(by_user),
        }
    }

    pub fn users(&self) -> usize {
        self.by_user.len()
    }

    pub fn records(&self) -> usize {
        self.by_user.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn user_records(&self, user_id: i64) -> anyhow::Result<Vec<TransactionRecord>> {
        Ok(self.by_user.get(&user_id).cloned().unwrap_or_default())
    }

    fn source_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::window::tests::rec;

    #[tokio::test]
    async fn groups_by_user_in_source_order() {
        let mut other = rec(Some("2025-05-02"), "Кино", 5);
        other.user_id = 8;
        let ledger = InMemoryLedger::new(vec![
            rec(Some("2025-05-03"), "Такси", 1),
            other,
            rec(Some("2025-05-01"), "АЗС", 2),
        ]);
        assert_eq!(ledger.users(), 2);
        assert_eq!(ledger.records(), 3);

        let amounts: Vec<i64> = ledger
            .user_records(7)
            .await
            .unwrap()
            .iter()
            .map(|r| r.amount)
            .collect();
        assert_eq!(amounts, vec![1, 2]);
        assert!(ledger.user_records(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn clones_share_the_snapshot() {
        let a = InMemoryLedger::new(vec![rec(None, "Такси", 1)]);
        let b = a.clone();
        assert!(Arc::ptr_eq(&a.by_user, &b.by_user));
    }
}
