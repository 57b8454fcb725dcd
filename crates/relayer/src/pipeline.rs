use tracing::instrument;
use zkbridge_client::{SubmitOutcome, VerifierClient};
use zkbridge_types::DepositRecord;

use crate::{assembler::ProofAssembler, error::RelayError, witness::WitnessBuilder};

/// Witness Builder, Proof Assembler and Submission Client chained for one deposit.
#[derive(Debug)]
pub struct DepositPipeline {
    witness_builder: WitnessBuilder,
    assembler: ProofAssembler,
    client: VerifierClient,
}

impl DepositPipeline {
    /// Creates a pipeline.
    pub fn new(
        witness_builder: WitnessBuilder,
        assembler: ProofAssembler,
        client: VerifierClient,
    ) -> Self {
        Self {
            witness_builder,
            assembler,
            client,
        }
    }

    /// Builds, signs and submits `record` once. The verifier's answer is classified, not
    /// retried.
    #[instrument(skip_all, fields(deposit_id = %record.deposit_id))]
    pub async fn relay(&self, record: &DepositRecord) -> Result<SubmitOutcome, RelayError> {
        let witness = self.witness_builder.build(record)?;
        let submission = self
            .assembler
            .assemble(&witness, &record.recipient_address)
            .await?;
        Ok(self.client.submit(&submission).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::{Json, Router, http::StatusCode, routing::post};
    use tokio::net::TcpListener;
    use zkbridge_client::{SubmitOutcome, VerifierClient};
    use zkbridge_signer::{SignatureVerifier, SignerConfig, SigningKey};
    use zkbridge_types::{
        Admission, DepositId, DepositRecord, RejectionReason, Submission, SubmitResponse, Witness,
    };

    use crate::{
        assembler::ProofAssembler, error::RelayError, pipeline::DepositPipeline,
        witness::{InvalidRecord, WitnessBuilder},
    };

    fn signer() -> SigningKey {
        SigningKey::from_config(&SignerConfig::MockSig {
            key: "demo-relayer-key".to_string(),
        })
        .unwrap()
    }

    /// Verifier stand-in that checks the mock signature and the embedded witness.
    async fn checking_verifier() -> SocketAddr {
        let router = Router::new().route(
            "/submit",
            post(|Json(submission): Json<Submission>| async move {
                let proof = submission.proof.unwrap();
                let witness = Witness::decode(&proof.payload).unwrap();
                if !signer().verifying_key().verify(&proof.payload, &proof.signature)
                    || witness.deposit_id != submission.deposit_id
                {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(SubmitResponse::Rejected {
                            deposit_id: Some(submission.deposit_id),
                            reason: RejectionReason::InvalidSignature,
                            detail: "signature mismatch".to_string(),
                        }),
                    );
                }
                (
                    StatusCode::OK,
                    Json(SubmitResponse::Admitted(Admission {
                        deposit_id: submission.deposit_id,
                        credited_to: submission.recipient_address,
                    })),
                )
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        addr
    }

    fn pipeline(base_url: &str) -> DepositPipeline {
        DepositPipeline::new(
            WitnessBuilder::new("w1"),
            ProofAssembler::new(signer(), "relayer-1"),
            VerifierClient::new(base_url).unwrap(),
        )
    }

    fn record() -> DepositRecord {
        DepositRecord {
            deposit_id: DepositId::from("d1"),
            txid: "tx-abc".to_string(),
            block_height: 100,
            amount: 1.0,
            recipient_address: "B62qrecipient".to_string(),
        }
    }

    #[tokio::test]
    async fn test_relay_admits_signed_deposit() {
        let addr = checking_verifier().await;
        let outcome = pipeline(&format!("http://{addr}"))
            .relay(&record())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            SubmitOutcome::Admitted(Admission {
                deposit_id: DepositId::from("d1"),
                credited_to: "B62qrecipient".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_invalid_record_is_not_submitted() {
        // Nothing listens here; reaching the client would surface a transport error.
        let pipeline = pipeline("http://127.0.0.1:1");
        let mut r = record();
        r.txid.clear();

        assert!(matches!(
            pipeline.relay(&r).await,
            Err(RelayError::InvalidRecord(InvalidRecord::EmptyTxid))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_verifier_is_transport_error() {
        let pipeline = pipeline("http://127.0.0.1:1");

        assert!(matches!(
            pipeline.relay(&record()).await,
            Err(RelayError::Transport(_))
        ));
    }
}
