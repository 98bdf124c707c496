//! On-chain payment verification by reference key.
//!
//! A payer's wallet adds the request's unique reference key to the transfer
//! transaction as an extra account. To confirm the payment the verifier walks
//! the recipient's most recent signatures, newest first, and returns the first
//! transaction that both
//!
//! 1. contains a System Program `transfer` to the recipient of exactly the
//!    requested lamports, and
//! 2. lists the reference among its account keys, in any role.
//!
//! Signatures the node reports as failed are skipped without being fetched.
//! Transactions the node does not return are skipped. Instructions that are
//! not parsed System Program transfers are ignored.

use futures_util::StreamExt;
use futures_util::stream;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::chain::{Address, LedgerHistory, ParsedTransaction, UiInstruction};
use crate::pay::config::VerifierConfig;
use crate::pay::error::VerifyError;
use crate::pay::types::{
    SYSTEM_PROGRAM_ID, TransferInstruction, VerificationRequest, VerifiedPayment,
};

#[cfg(feature = "telemetry")]
use tracing::instrument;

/// Scans a recipient's recent history for a payment carrying a reference key.
#[derive(Debug, Clone)]
pub struct ReferenceVerifier<P> {
    provider: P,
    config: VerifierConfig,
}

impl<P> ReferenceVerifier<P> {
    /// Creates a verifier reading the ledger through `provider`.
    pub const fn new(provider: P, config: VerifierConfig) -> Self {
        Self { provider, config }
    }

    /// The ledger provider.
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// The verifier configuration.
    pub const fn config(&self) -> &VerifierConfig {
        &self.config
    }
}

impl<P: LedgerHistory> ReferenceVerifier<P> {
    /// Looks for a payment matching `request`.
    ///
    /// Returns `Ok(None)` when no recent transaction matches.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::Provider`] if the signature listing or a
    /// transaction fetch fails, and [`VerifyError::TimedOut`] if the configured
    /// deadline passes first.
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "solpick.verify",
            skip_all,
            fields(reference = %request.reference(), recipient = %request.recipient()),
            err
        )
    )]
    pub async fn verify(
        &self,
        request: &VerificationRequest,
    ) -> Result<Option<VerifiedPayment>, VerifyError> {
        match self.config.timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.scan(request))
                .await
                .map_err(|_| VerifyError::TimedOut(timeout))?,
            None => self.scan(request).await,
        }
    }

    /// Like [`Self::verify`], abandoning the scan when `cancel` fires.
    ///
    /// # Errors
    ///
    /// As [`Self::verify`], plus [`VerifyError::Cancelled`].
    pub async fn verify_with_cancel(
        &self,
        request: &VerificationRequest,
        cancel: &CancellationToken,
    ) -> Result<Option<VerifiedPayment>, VerifyError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(VerifyError::Cancelled),
            result = self.verify(request) => result,
        }
    }

    async fn scan(
        &self,
        request: &VerificationRequest,
    ) -> Result<Option<VerifiedPayment>, VerifyError> {
        let limit = self.config.effective_signature_limit();
        let signatures = self
            .provider
            .list_recent_signatures(request.recipient(), limit)
            .await?;

        let candidates = signatures
            .into_iter()
            .take(limit)
            .filter(|info| !info.is_failed())
            .map(|info| info.signature);

        let provider = &self.provider;
        let mut fetched = stream::iter(candidates.map(|signature| async move {
            let transaction = provider.fetch_parsed_transaction(&signature).await;
            (signature, transaction)
        }))
        .buffered(self.config.fetch_concurrency.max(1));

        while let Some((signature, transaction)) = fetched.next().await {
            let Some(transaction) = transaction? else {
                #[cfg(feature = "telemetry")]
                tracing::debug!(%signature, "Transaction not available, skipping");
                continue;
            };
            if matches_request(&transaction, request) {
                #[cfg(feature = "telemetry")]
                tracing::info!(%signature, "Payment verified");
                return Ok(Some(VerifiedPayment::confirmed(signature)));
            }
        }
        Ok(None)
    }
}

/// Whether `transaction` pays `request` and carries its reference.
#[must_use]
pub fn matches_request(transaction: &ParsedTransaction, request: &VerificationRequest) -> bool {
    let pays = transaction
        .instructions()
        .iter()
        .filter_map(parse_system_transfer)
        .any(|transfer| {
            transfer.destination == *request.recipient()
                && transfer.lamports == request.lamports()
        });
    pays && transaction.references_account(request.reference())
}

#[derive(Deserialize)]
struct ParsedPayload {
    #[serde(rename = "type")]
    kind: String,
    info: TransferInfo,
}

#[derive(Deserialize)]
struct TransferInfo {
    source: String,
    destination: String,
    lamports: u64,
}

/// Decodes a node-parsed System Program `transfer`.
///
/// Returns `None` for any other program, any other instruction type, raw
/// instructions and payloads with missing or malformed fields.
#[must_use]
pub fn parse_system_transfer(instruction: &UiInstruction) -> Option<TransferInstruction> {
    let UiInstruction::Parsed(parsed) = instruction else {
        return None;
    };
    let program_id: Address = parsed.program_id.parse().ok()?;
    if *program_id.pubkey() != SYSTEM_PROGRAM_ID {
        return None;
    }
    let payload = ParsedPayload::deserialize(&parsed.parsed).ok()?;
    if payload.kind != "transfer" {
        return None;
    }
    Some(TransferInstruction {
        source: payload.info.source.parse().ok()?,
        destination: payload.info.destination.parse().ok()?,
        lamports: payload.info.lamports,
    })
}
