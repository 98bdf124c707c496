//! Unsigned SOL transfer transactions for wallets to sign.
//!
//! The payer's wallet receives a base64 transaction with one System Program
//! `transfer`, the payer as fee payer and an all-zero signature slot. Nothing
//! here signs or submits anything.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as b64;
use solana_message::{Hash, Message, VersionedMessage};
use solana_signature::Signature;
use solana_system_interface::instruction as system_instruction;
use solana_transaction::versioned::VersionedTransaction;

use crate::chain::RpcClient;
use crate::pay::error::TransactionError;
use crate::pay::types::TransferRequest;

/// Builds the unsigned transfer described by `request` against `recent_blockhash`.
#[must_use]
pub fn build_unsigned_transfer(
    request: &TransferRequest,
    recent_blockhash: Hash,
) -> VersionedTransaction {
    let payer = request.payer().pubkey();
    let instruction =
        system_instruction::transfer(payer, request.recipient().pubkey(), request.lamports());
    let message = Message::new_with_blockhash(&[instruction], Some(payer), &recent_blockhash);
    let required = usize::from(message.header.num_required_signatures);
    VersionedTransaction {
        signatures: vec![Signature::default(); required],
        message: VersionedMessage::Legacy(message),
    }
}

/// Encodes a transaction as base64 wire bytes.
///
/// # Errors
///
/// Returns [`TransactionError::Serialize`] if bincode encoding fails.
pub fn encode_transaction(transaction: &VersionedTransaction) -> Result<String, TransactionError> {
    let bytes =
        bincode::serialize(transaction).map_err(|e| TransactionError::Serialize(e.to_string()))?;
    Ok(b64.encode(bytes))
}

/// Decodes a base58 blockhash as returned by `getLatestBlockhash`.
///
/// # Errors
///
/// Returns [`TransactionError::InvalidBlockhash`] unless the input is base58 of 32 bytes.
pub fn parse_blockhash(blockhash: &str) -> Result<Hash, TransactionError> {
    let bytes = bs58::decode(blockhash)
        .into_vec()
        .map_err(|_| TransactionError::InvalidBlockhash(blockhash.to_owned()))?;
    let bytes: [u8; 32] = bytes
        .try_into()
        .map_err(|_| TransactionError::InvalidBlockhash(blockhash.to_owned()))?;
    Ok(Hash::new_from_array(bytes))
}

/// Fetches a recent blockhash and returns the unsigned transfer as base64.
///
/// # Errors
///
/// Returns [`TransactionError::Provider`] if the blockhash cannot be fetched,
/// [`TransactionError::InvalidBlockhash`] if the node returns garbage and
/// [`TransactionError::Serialize`] if encoding fails.
#[cfg_attr(
    feature = "telemetry",
    tracing::instrument(
        name = "solpick.serialize_transfer",
        skip_all,
        fields(payer = %request.payer(), lamports = request.lamports()),
        err
    )
)]
pub async fn serialize_transfer_transaction(
    rpc: &RpcClient,
    request: &TransferRequest,
) -> Result<String, TransactionError> {
    let latest = rpc.get_latest_blockhash().await?;
    let blockhash = parse_blockhash(&latest.blockhash)?;
    let transaction = build_unsigned_transfer(request, blockhash);
    encode_transaction(&transaction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Address;
    use crate::pay::types::SYSTEM_PROGRAM_ID;
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BLOCKHASH: &str = "EkSnNWid2cvwEVnVx9aBqawnmiCNiDgp3gUdkDPTKN1N";

    fn request() -> TransferRequest {
        TransferRequest::parse(
            Address::from_bytes([2; 32]),
            "0.01",
            Address::from_bytes([1; 32]),
        )
        .unwrap()
    }

    fn decode(encoded: &str) -> VersionedTransaction {
        let bytes = b64.decode(encoded).unwrap();
        bincode::deserialize(&bytes).unwrap()
    }

    #[test]
    fn test_single_transfer_with_payer_as_fee_payer() {
        let blockhash = parse_blockhash(BLOCKHASH).unwrap();
        let tx = build_unsigned_transfer(&request(), blockhash);

        assert_eq!(tx.signatures, vec![Signature::default()]);
        let keys = tx.message.static_account_keys();
        assert_eq!(keys[0], *request().payer().pubkey());
        assert_eq!(keys[1], *request().recipient().pubkey());
        assert_eq!(keys[2], SYSTEM_PROGRAM_ID);
        assert_eq!(*tx.message.recent_blockhash(), blockhash);

        let instructions = tx.message.instructions();
        assert_eq!(instructions.len(), 1);
        let mut data = 2u32.to_le_bytes().to_vec();
        data.extend_from_slice(&10_000_000u64.to_le_bytes());
        assert_eq!(instructions[0].data, data);
        assert_eq!(instructions[0].accounts, vec![0, 1]);
    }

    #[test]
    fn test_bad_blockhash() {
        assert!(matches!(
            parse_blockhash("0OIl"),
            Err(TransactionError::InvalidBlockhash(_))
        ));
        assert!(matches!(
            parse_blockhash("abc"),
            Err(TransactionError::InvalidBlockhash(_))
        ));
    }

    #[tokio::test]
    async fn test_serialize_fetches_blockhash() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "getLatestBlockhash"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": {
                    "context": {"slot": 1},
                    "value": {"blockhash": BLOCKHASH, "lastValidBlockHeight": 200}
                }
            })))
            .expect(1)
            .mount(&server)
            .await;
        let rpc = RpcClient::new(server.uri().parse::<Url>().unwrap());

        let encoded = serialize_transfer_transaction(&rpc, &request()).await.unwrap();
        let tx = decode(&encoded);
        assert_eq!(
            *tx.message.recent_blockhash(),
            parse_blockhash(BLOCKHASH).unwrap()
        );
        assert_eq!(tx.signatures.len(), 1);
    }

    #[tokio::test]
    async fn test_serialize_surfaces_provider_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;
        let rpc = RpcClient::new(server.uri().parse::<Url>().unwrap());

        let err = serialize_transfer_transaction(&rpc, &request())
            .await
            .unwrap_err();
        assert!(matches!(err, TransactionError::Provider(ref e) if e.is_rate_limited()));
    }
}
