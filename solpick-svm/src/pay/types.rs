//! Requests and results of the payment flow.

use serde::{Deserialize, Serialize};
use solana_pubkey::{Pubkey, pubkey};
use solpick::{AmountError, AmountInput, DecimalAmount};

use crate::chain::{Address, AddressInput};
use crate::pay::error::{TransactionError, VerifyError};

/// Native System Program id.
pub const SYSTEM_PROGRAM_ID: Pubkey = pubkey!("11111111111111111111111111111111");

/// Lamports in one SOL.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Decimal places of SOL.
pub const SOL_DECIMALS: u32 = 9;

/// Converts a SOL amount to lamports, rounding half away from zero.
///
/// # Errors
///
/// Returns [`AmountError`] if the amount rounds to zero lamports or does not fit in a `u64`.
pub fn sol_to_lamports(amount: &DecimalAmount) -> Result<u64, AmountError> {
    amount.to_minor_units(SOL_DECIMALS)
}

/// A validated request to look for a payment on the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    reference: Address,
    recipient: Address,
    amount: DecimalAmount,
    lamports: u64,
}

impl VerificationRequest {
    /// Builds a request from already-typed parts.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError`] if `amount` has no lamport representation.
    pub fn new(
        reference: Address,
        recipient: Address,
        amount: DecimalAmount,
    ) -> Result<Self, AmountError> {
        let lamports = sol_to_lamports(&amount)?;
        Ok(Self {
            reference,
            recipient,
            amount,
            lamports,
        })
    }

    /// Validates raw caller input. The reference is checked first, then the
    /// recipient, then the amount.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::InvalidAddress`] or [`VerifyError::InvalidAmount`].
    pub fn parse(
        reference: impl AddressInput,
        recipient: impl AddressInput,
        amount: impl AmountInput,
    ) -> Result<Self, VerifyError> {
        let reference = reference.into_address("reference")?;
        let recipient = recipient.into_address("recipient")?;
        let amount = amount.into_amount()?;
        Ok(Self::new(reference, recipient, amount)?)
    }

    /// The unique reference key expected among the transaction's accounts.
    #[must_use]
    pub const fn reference(&self) -> &Address {
        &self.reference
    }

    /// The account that must receive the transfer.
    #[must_use]
    pub const fn recipient(&self) -> &Address {
        &self.recipient
    }

    /// The requested amount in SOL.
    #[must_use]
    pub const fn amount(&self) -> &DecimalAmount {
        &self.amount
    }

    /// The requested amount in lamports.
    #[must_use]
    pub const fn lamports(&self) -> u64 {
        self.lamports
    }
}

/// A transaction found to satisfy a [`VerificationRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedPayment {
    /// Signature of the matching transaction.
    pub signature: String,
    /// Always `true`; the transaction was read at `confirmed` commitment or better.
    pub confirmed: bool,
}

impl VerifiedPayment {
    /// A confirmed payment with the given signature.
    pub fn confirmed(signature: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
            confirmed: true,
        }
    }
}

/// A decoded System Program transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferInstruction {
    /// Funding account.
    pub source: Address,
    /// Receiving account.
    pub destination: Address,
    /// Amount moved.
    pub lamports: u64,
}

/// A validated request to build an unsigned SOL transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    recipient: Address,
    payer: Address,
    amount: DecimalAmount,
    lamports: u64,
}

impl TransferRequest {
    /// Builds a request from already-typed parts.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError`] if `amount` has no lamport representation.
    pub fn new(
        recipient: Address,
        amount: DecimalAmount,
        payer: Address,
    ) -> Result<Self, AmountError> {
        let lamports = sol_to_lamports(&amount)?;
        Ok(Self {
            recipient,
            payer,
            amount,
            lamports,
        })
    }

    /// Validates raw caller input.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::InvalidAddress`] or [`TransactionError::InvalidAmount`].
    pub fn parse(
        recipient: impl AddressInput,
        amount: impl AmountInput,
        payer: impl AddressInput,
    ) -> Result<Self, TransactionError> {
        let recipient = recipient.into_address("recipient")?;
        let amount = amount.into_amount()?;
        let payer = payer.into_address("payer")?;
        Ok(Self::new(recipient, amount, payer)?)
    }

    /// Receiving account.
    #[must_use]
    pub const fn recipient(&self) -> &Address {
        &self.recipient
    }

    /// Fee payer and funding account.
    #[must_use]
    pub const fn payer(&self) -> &Address {
        &self.payer
    }

    /// Amount in SOL.
    #[must_use]
    pub const fn amount(&self) -> &DecimalAmount {
        &self.amount
    }

    /// Amount in lamports.
    #[must_use]
    pub const fn lamports(&self) -> u64 {
        self.lamports
    }
}
