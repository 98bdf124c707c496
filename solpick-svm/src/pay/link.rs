//! Payment links: `solana:` URLs for wallets and hosted payment page URLs.

use solana_keypair::Keypair;
use solana_signer::Signer;
use solpick::DecimalAmount;
use url::Url;
use url::form_urlencoded;

use crate::chain::Address;

/// Returns a fresh random public key for use as a payment reference.
#[must_use]
pub fn generate_reference() -> Address {
    Address::new(Keypair::new().pubkey())
}

/// The parameters of a payment request as shown to the payer.
///
/// ```ignore
/// let link = PaymentLink::new(recipient)
///     .with_amount("0.01".parse()?)
///     .with_reference(generate_reference())
///     .with_label("Coffee Shop");
/// let url = link.solana_pay_url();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentLink {
    recipient: Address,
    amount: Option<DecimalAmount>,
    reference: Option<Address>,
    label: Option<String>,
    message: Option<String>,
    memo: Option<String>,
}

impl PaymentLink {
    /// A link paying `recipient` with no other parameters.
    #[must_use]
    pub const fn new(recipient: Address) -> Self {
        Self {
            recipient,
            amount: None,
            reference: None,
            label: None,
            message: None,
            memo: None,
        }
    }

    /// Sets the amount in SOL.
    #[must_use]
    pub const fn with_amount(mut self, amount: DecimalAmount) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Sets the reference key.
    #[must_use]
    pub const fn with_reference(mut self, reference: Address) -> Self {
        self.reference = Some(reference);
        self
    }

    /// Sets the merchant label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the message shown to the payer.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the on-chain memo.
    #[must_use]
    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    /// Receiving account.
    #[must_use]
    pub const fn recipient(&self) -> &Address {
        &self.recipient
    }

    /// `solana:<recipient>?amount=..&reference=..&label=..&message=..&memo=..`
    ///
    /// Empty or unset parameters are left out, and so is the `?` when none remain.
    #[must_use]
    pub fn solana_pay_url(&self) -> String {
        let query = self.query(false);
        if query.is_empty() {
            format!("solana:{}", self.recipient)
        } else {
            format!("solana:{}?{query}", self.recipient)
        }
    }

    /// `<base>?recipient=..&amount=..&reference=..&label=..&message=..&memo=..`
    ///
    /// Parameters already present in `base` are kept in front.
    #[must_use]
    pub fn hosted_url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        let query = match base.query() {
            Some(existing) if !existing.is_empty() => format!("{existing}&{}", self.query(true)),
            _ => self.query(true),
        };
        url.set_query(Some(&query));
        url
    }

    fn query(&self, with_recipient: bool) -> String {
        let mut pairs: Vec<(&str, String)> = Vec::with_capacity(6);
        if with_recipient {
            pairs.push(("recipient", self.recipient.to_string()));
        }
        if let Some(amount) = &self.amount {
            pairs.push(("amount", amount.to_string()));
        }
        if let Some(reference) = &self.reference {
            pairs.push(("reference", reference.to_string()));
        }
        for (name, value) in [
            ("label", &self.label),
            ("message", &self.message),
            ("memo", &self.memo),
        ] {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                pairs.push((name, value.to_owned()));
            }
        }
        encode_query(&pairs)
    }
}

/// Form-encodes `pairs`, writing spaces as `%20` rather than `+`.
fn encode_query(pairs: &[(&str, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter().map(|(k, v)| (*k, v.as_str())))
        .finish()
        .replace('+', "%20")
}
