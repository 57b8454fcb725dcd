use reqwest::{Client, IntoUrl, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::ParseError;
use zkbridge_types::{
    Admission, DepositId, DepositStatusResponse, RejectionReason, Submission, SubmitResponse,
};

use crate::Error;

/// Classified result of a single submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The deposit was admitted by this attempt.
    Admitted(Admission),
    /// The deposit had already been admitted; treat as success, nothing was credited twice.
    AlreadyProcessed(DepositId),
    /// The verifier rejected the submission.
    Rejected {
        /// Rejection category.
        reason: RejectionReason,
        /// Human-readable detail from the verifier.
        detail: String,
    },
}

impl SubmitOutcome {
    /// Returns `true` for `Admitted` and `AlreadyProcessed`.
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Rejected { .. })
    }
}

impl From<SubmitResponse> for SubmitOutcome {
    fn from(response: SubmitResponse) -> Self {
        match response {
            SubmitResponse::Admitted(admission) => Self::Admitted(admission),
            SubmitResponse::AlreadyProcessed { deposit_id } => Self::AlreadyProcessed(deposit_id),
            SubmitResponse::Rejected { reason, detail, .. } => Self::Rejected { reason, detail },
        }
    }
}

/// HTTP client for the zkbridge verifier.
///
/// Each call is a single attempt: transport failures are returned as [`Error`] and never
/// retried internally.
#[derive(Clone, Debug)]
pub struct VerifierClient {
    base_url: Url,
    client: Client,
}

impl VerifierClient {
    /// Creates a new client connected to the specified verifier URL.
    pub fn new(base_url: impl IntoUrl) -> Result<Self, Error> {
        Ok(Self {
            base_url: base_url.into_url()?,
            client: Client::new(),
        })
    }

    /// Creates a new client with a custom [`reqwest::Client`].
    pub fn with_client(base_url: impl IntoUrl, client: Client) -> Result<Self, Error> {
        Ok(Self {
            base_url: base_url.into_url()?,
            client,
        })
    }

    /// Returns the verifier base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Sends a GET request to the specified path and deserializes the response.
    pub async fn get<Res: DeserializeOwned>(&self, path: &str) -> Result<Res, Error> {
        self.get_url(self.base_url.join(path)?).await
    }

    async fn get_url<Res: DeserializeOwned>(&self, url: Url) -> Result<Res, Error> {
        let res = send(self.client.get(url)).await?;
        Ok(res.json::<Res>().await?)
    }

    /// Submits a deposit for admission and classifies the verifier's answer.
    ///
    /// Both success responses and rejections (4xx) carry a [`SubmitResponse`] body; anything
    /// else is surfaced as [`Error::ErrorStatus`].
    pub async fn submit(&self, submission: &Submission) -> Result<SubmitOutcome, Error> {
        let url = self.base_url.join("submit")?;
        let res = self.client.post(url.clone()).json(submission).send().await?;
        let status = res.status();

        if status.is_success() || status.is_client_error() {
            let body = res.bytes().await?;
            match serde_json::from_slice::<SubmitResponse>(&body) {
                Ok(response) => {
                    debug!(deposit_id = %submission.deposit_id, %status, "Verifier answered");
                    return Ok(response.into());
                }
                Err(_) => {
                    return Err(Error::ErrorStatus {
                        url: url.to_string(),
                        status: status.as_u16(),
                        msg: Some(String::from_utf8_lossy(&body).into_owned()),
                    });
                }
            }
        }

        Err(Error::ErrorStatus {
            url: url.to_string(),
            status: status.as_u16(),
            msg: res.text().await.ok(),
        })
    }

    /// Returns whether the verifier has admitted `deposit_id`.
    ///
    /// The id is sent as a single percent-encoded path segment, so ids containing `/`, `?` or
    /// `#` address the same deposit.
    pub async fn is_processed(&self, deposit_id: &DepositId) -> Result<bool, Error> {
        let mut url = self.base_url.join("deposits")?;
        url.path_segments_mut()
            .map_err(|()| Error::Url(ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push(deposit_id.as_str());
        let res: DepositStatusResponse = self.get_url(url).await?;
        Ok(res.processed)
    }

    /// Checks if the verifier is healthy and responsive.
    pub async fn health(&self) -> Result<(), Error> {
        send(self.client.get(self.base_url.join("health")?)).await?;
        Ok(())
    }
}

/// Sends an HTTP request and handles error status codes.
pub(crate) async fn send(request: RequestBuilder) -> Result<Response, Error> {
    let res = request.send().await?;

    if !res.status().is_success() {
        let url = res.url().to_string();
        let status = res.status().as_u16();
        let msg = res.text().await.ok();
        return Err(Error::ErrorStatus { url, status, msg });
    }

    Ok(res)
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::{Json, Router, http::StatusCode, routing::post};
    use tokio::net::TcpListener;
    use zkbridge_types::{DepositId, RejectionReason, Submission, SubmitResponse};

    use crate::{Error, SubmitOutcome, VerifierClient};

    async fn serve(router: Router) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        addr
    }

    fn submission() -> Submission {
        Submission {
            deposit_id: DepositId::from("d1"),
            proof: None,
            recipient_address: "B62qrecipient".to_string(),
            metadata: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_rejection_is_classified_not_an_error() {
        let router = Router::new().route(
            "/submit",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(SubmitResponse::Rejected {
                        deposit_id: Some(DepositId::from("d1")),
                        reason: RejectionReason::Malformed,
                        detail: "missing proof".to_string(),
                    }),
                )
            }),
        );
        let addr = serve(router).await;
        let client = VerifierClient::new(format!("http://{addr}")).unwrap();

        let outcome = client.submit(&submission()).await.unwrap();
        assert_eq!(
            outcome,
            SubmitOutcome::Rejected {
                reason: RejectionReason::Malformed,
                detail: "missing proof".to_string(),
            }
        );
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn test_already_processed_is_success() {
        let router = Router::new().route(
            "/submit",
            post(|| async {
                Json(SubmitResponse::AlreadyProcessed {
                    deposit_id: DepositId::from("d1"),
                })
            }),
        );
        let addr = serve(router).await;
        let client = VerifierClient::new(format!("http://{addr}")).unwrap();

        let outcome = client.submit(&submission()).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::AlreadyProcessed(DepositId::from("d1")));
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_server_error_is_error_status() {
        let router = Router::new().route(
            "/submit",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "store unavailable") }),
        );
        let addr = serve(router).await;
        let client = VerifierClient::new(format!("http://{addr}")).unwrap();

        let err = client.submit(&submission()).await.unwrap_err();
        assert!(matches!(err, Error::ErrorStatus { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_unreachable_verifier_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = VerifierClient::new(format!("http://{addr}")).unwrap();
        let err = client.submit(&submission()).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }
}
