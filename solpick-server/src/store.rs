//! Payment request storage.
//!
//! Records are keyed by their reference. A record older than the store's TTL
//! is treated as gone, paid or not: lookups skip it and
//! [`PaymentStore::sweep_expired`] deletes it.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};
use solpick::{DecimalAmount, UnixTimestamp};
use solpick_svm::chain::Address;
use solpick_svm::pay::PaymentLink;
use std::time::Duration;

/// A stored payment request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    /// Unique reference key the payer's transaction must include.
    pub reference: Address,
    /// Receiving account.
    pub recipient: Address,
    /// Requested amount in SOL, normalized.
    pub amount: DecimalAmount,
    /// Merchant label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Message shown to the payer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// On-chain memo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    /// Creation time.
    pub created_at: UnixTimestamp,
    /// Whether a payment was confirmed.
    pub paid: bool,
    /// When the payment was confirmed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<UnixTimestamp>,
}

impl PaymentRecord {
    /// A new unpaid record created now.
    #[must_use]
    pub fn new(reference: Address, recipient: Address, amount: DecimalAmount) -> Self {
        Self {
            reference,
            recipient,
            amount,
            label: None,
            message: None,
            memo: None,
            created_at: UnixTimestamp::now(),
            paid: false,
            paid_at: None,
        }
    }

    /// Whether the record should be treated as gone at `now`.
    #[must_use]
    pub const fn is_expired_at(&self, now: UnixTimestamp, ttl: Duration) -> bool {
        self.created_at.is_expired_at(now, ttl)
    }

    /// The payment link describing this request.
    #[must_use]
    pub fn link(&self) -> PaymentLink {
        let mut link = PaymentLink::new(self.recipient)
            .with_amount(self.amount)
            .with_reference(self.reference);
        if let Some(label) = &self.label {
            link = link.with_label(label.clone());
        }
        if let Some(message) = &self.message {
            link = link.with_message(message.clone());
        }
        if let Some(memo) = &self.memo {
            link = link.with_memo(memo.clone());
        }
        link
    }
}

/// Errors raised by a [`PaymentStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A record with this reference already exists.
    #[error("Payment request {0} already exists")]
    Duplicate(Address),
    /// The storage backend failed.
    #[error("Storage backend failed: {0}")]
    Backend(String),
}

/// Persistence for payment requests.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Inserts a new record.
    async fn create(&self, record: PaymentRecord) -> Result<PaymentRecord, StoreError>;

    /// The live record for `reference`.
    async fn get(&self, reference: &Address) -> Result<Option<PaymentRecord>, StoreError>;

    /// Marks the record paid at `at`, returning the updated record.
    async fn mark_paid(
        &self,
        reference: &Address,
        at: UnixTimestamp,
    ) -> Result<Option<PaymentRecord>, StoreError>;

    /// Marks the record unpaid, returning the updated record.
    async fn mark_unpaid(&self, reference: &Address) -> Result<Option<PaymentRecord>, StoreError>;

    /// Deletes the record, returning it.
    async fn remove(&self, reference: &Address) -> Result<Option<PaymentRecord>, StoreError>;

    /// Deletes every record that expired by `now`; returns how many.
    async fn sweep_expired(&self, now: UnixTimestamp) -> Result<usize, StoreError>;
}

/// In-process [`PaymentStore`] backed by a concurrent map.
#[derive(Debug)]
pub struct MemoryStore {
    records: DashMap<Address, PaymentRecord>,
    ttl: Duration,
}

impl MemoryStore {
    /// An empty store expiring records `ttl` after creation.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            records: DashMap::new(),
            ttl,
        }
    }

    /// Number of records held, expired or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Applies `update` to the live record for `reference`.
    fn update_live<F>(&self, reference: &Address, update: F) -> Option<PaymentRecord>
    where
        F: FnOnce(&mut PaymentRecord),
    {
        let now = UnixTimestamp::now();
        let mut entry = self.records.get_mut(reference)?;
        if entry.is_expired_at(now, self.ttl) {
            return None;
        }
        update(&mut *entry);
        Some(entry.value().clone())
    }
}

#[async_trait]
impl PaymentStore for MemoryStore {
    async fn create(&self, record: PaymentRecord) -> Result<PaymentRecord, StoreError> {
        match self.records.entry(record.reference) {
            Entry::Occupied(_) => Err(StoreError::Duplicate(record.reference)),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    async fn get(&self, reference: &Address) -> Result<Option<PaymentRecord>, StoreError> {
        let now = UnixTimestamp::now();
        Ok(self
            .records
            .get(reference)
            .filter(|record| !record.is_expired_at(now, self.ttl))
            .map(|record| record.value().clone()))
    }

    async fn mark_paid(
        &self,
        reference: &Address,
        at: UnixTimestamp,
    ) -> Result<Option<PaymentRecord>, StoreError> {
        Ok(self.update_live(reference, |record| {
            record.paid = true;
            record.paid_at = Some(at);
        }))
    }

    async fn mark_unpaid(&self, reference: &Address) -> Result<Option<PaymentRecord>, StoreError> {
        Ok(self.update_live(reference, |record| record.paid = false))
    }

    async fn remove(&self, reference: &Address) -> Result<Option<PaymentRecord>, StoreError> {
        let now = UnixTimestamp::now();
        Ok(self
            .records
            .remove(reference)
            .map(|(_, record)| record)
            .filter(|record| !record.is_expired_at(now, self.ttl)))
    }

    async fn sweep_expired(&self, now: UnixTimestamp) -> Result<usize, StoreError> {
        let before = self.records.len();
        self.records
            .retain(|_, record| !record.is_expired_at(now, self.ttl));
        Ok(before.saturating_sub(self.records.len()))
    }
}
