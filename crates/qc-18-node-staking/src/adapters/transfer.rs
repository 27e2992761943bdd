//! In-memory native value-transfer primitive.

use crate::domain::{Address, Amount, Collaborator, StakingError, StakingResult};
use crate::ports::{TransferReceipt, ValueTransfer};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

#[derive(Default)]
struct TransferBook {
    balances: HashMap<Address, Amount>,
    outstanding: HashMap<Uuid, TransferReceipt>,
    total_paid: Amount,
}

/// Credits recipients in memory; receipts stay reversible until reversed or
/// finalized.
#[derive(Default)]
pub struct InMemoryValueTransfer {
    book: RwLock<TransferBook>,
    rejected: RwLock<HashSet<Address>>,
    failing: AtomicBool,
}

impl InMemoryValueTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Native value received by `address`.
    #[must_use]
    pub fn balance_of(&self, address: &Address) -> Amount {
        self.book
            .read()
            .balances
            .get(address)
            .copied()
            .unwrap_or_default()
    }

    /// Net native value paid out of custody.
    #[must_use]
    pub fn total_paid(&self) -> Amount {
        self.book.read().total_paid
    }

    /// Fail every transfer to `address`.
    /// Receipts that can still be reversed.
    #[must_use]
    pub fn outstanding_receipts(&self) -> usize {
        self.book.read().outstanding.len()
    }

    pub fn reject_recipient(&self, address: Address) {
        self.rejected.write().insert(address);
    }

    pub fn accept_recipient(&self, address: &Address) {
        self.rejected.write().remove(address);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ValueTransfer for InMemoryValueTransfer {
    async fn transfer(&self, to: &Address, amount: Amount) -> StakingResult<TransferReceipt> {
        if self.failing.load(Ordering::SeqCst) || self.rejected.read().contains(to) {
            return Err(StakingError::custody(
                Collaborator::ValueTransfer,
                format!("transfer of {amount} to {to} rejected"),
            ));
        }

        let receipt = TransferReceipt {
            id: Uuid::new_v4(),
            to: *to,
            amount,
        };

        let mut book = self.book.write();
        let balance = book.balances.entry(*to).or_default();
        *balance = balance.saturating_add(amount);
        book.total_paid = book.total_paid.saturating_add(amount);
        book.outstanding.insert(receipt.id, receipt.clone());
        Ok(receipt)
    }

    async fn reverse_transfer(&self, receipt: &TransferReceipt) -> StakingResult<()> {
        let mut book = self.book.write();
        if book.outstanding.remove(&receipt.id).is_none() {
            return Err(StakingError::custody(
                Collaborator::ValueTransfer,
                format!("unknown or already reversed receipt {}", receipt.id),
            ));
        }

        let balance = book.balances.entry(receipt.to).or_default();
        *balance = balance.saturating_sub(receipt.amount);
        book.total_paid = book.total_paid.saturating_sub(receipt.amount);
        Ok(())
    }

    fn finalize_transfer(&self, receipt: &TransferReceipt) {
        self.book.write().outstanding.remove(&receipt.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_transfer_and_reverse() {
        let transfer = InMemoryValueTransfer::new();
        let to = Address::new([8; 20]);

        let receipt = transfer.transfer(&to, Amount::from(400)).await.unwrap();
        assert_eq!(transfer.balance_of(&to), Amount::from(400));
        assert_eq!(transfer.total_paid(), Amount::from(400));

        transfer.reverse_transfer(&receipt).await.unwrap();
        assert_eq!(transfer.balance_of(&to), Amount::zero());
        assert_eq!(transfer.total_paid(), Amount::zero());
    }

    #[tokio::test]
    async fn test_double_reverse_fails() {
        let transfer = InMemoryValueTransfer::new();
        let receipt = transfer
            .transfer(&Address::new([8; 20]), Amount::from(1))
            .await
            .unwrap();

        transfer.reverse_transfer(&receipt).await.unwrap();
        assert!(transfer.reverse_transfer(&receipt).await.is_err());
    }

    #[tokio::test]
    async fn test_finalized_receipt_is_not_reversible() {
        let transfer = InMemoryValueTransfer::new();
        let to = Address::new([8; 20]);
        let receipt = transfer.transfer(&to, Amount::from(7)).await.unwrap();

        transfer.finalize_transfer(&receipt);

        assert_eq!(transfer.outstanding_receipts(), 0);
        assert!(transfer.reverse_transfer(&receipt).await.is_err());
        assert_eq!(transfer.balance_of(&to), Amount::from(7));
    }

    #[tokio::test]
    async fn test_rejected_recipient() {
        let transfer = InMemoryValueTransfer::new();
        let to = Address::new([8; 20]);
        transfer.reject_recipient(to);

        assert!(transfer.transfer(&to, Amount::from(1)).await.is_err());
        assert_eq!(transfer.balance_of(&to), Amount::zero());

        transfer.accept_recipient(&to);
        assert!(transfer.transfer(&to, Amount::from(1)).await.is_ok());
    }
}
