//! Digital signature workflow
//!
//! Two calls against the signature API: `iniciar` sends the signer's
//! certificate and returns the data to sign, `finalizar` sends the signature
//! back. With an access token set, both go through the public routes.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use viewer_core::{Headers, RenderEngine, RequestBody, Transport};

use crate::error::StoreError;
use crate::mutation::Mutation;
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigitalSignatureStart {
    pub certificate: String,
    pub document_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigitalSignatureFinish {
    pub document_id: String,
    pub signature: String,
    pub temporary_signature_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignatureStep {
    Start,
    Finish,
}

impl SignatureStep {
    fn path(self) -> &'static str {
        match self {
            SignatureStep::Start => "iniciar",
            SignatureStep::Finish => "finalizar",
        }
    }
}

impl<E: RenderEngine, T: Transport> Store<E, T> {
    pub fn set_access_token(&self, token: Option<Headers>) {
        self.commit(Mutation::SetAccessToken(token));
    }

    fn signature_url(&self, document_id: &str, step: SignatureStep, public: bool) -> String {
        let base = self.config.signature_api.trim_end_matches('/');
        let scope = if public { "/public" } else { "" };
        format!(
            "{}{}/documentos/{}/assinaturas/digitais/{}",
            base,
            scope,
            document_id,
            step.path()
        )
    }

    /// Send the certificate; errors propagate to the caller
    pub async fn start_digital_signature(
        &self,
        request: &DigitalSignatureStart,
    ) -> Result<Value, StoreError> {
        let access_token = self.state().flowbee.access_token.clone();
        let url = self.signature_url(
            &request.document_id,
            SignatureStep::Start,
            access_token.is_some(),
        );

        let mut headers = access_token.unwrap_or_default();
        headers.insert("Content-Type".to_string(), "text/plain".to_string());

        tracing::debug!("Starting digital signature for document {}", request.document_id);
        let data = self
            .transport
            .post(&url, RequestBody::Text(request.certificate.clone()), &headers)
            .await?;
        Ok(data)
    }

    pub async fn finish_digital_signature(
        &self,
        request: &DigitalSignatureFinish,
    ) -> Result<Value, StoreError> {
        let public = self.state().flowbee.access_token.is_some();
        let url = self.signature_url(&request.document_id, SignatureStep::Finish, public);
        let body = json!({
            "assinatura": request.signature,
            "assinaturaTemporariaId": request.temporary_signature_id,
        });

        tracing::debug!("Finishing digital signature for document {}", request.document_id);
        let data = self
            .transport
            .post(&url, RequestBody::Json(body), &Headers::new())
            .await?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use pretty_assertions::assert_eq;
    use viewer_core::testing::{FakeEngine, FakeTransport};
    use viewer_core::TransportError;

    const PRIVATE_START: &str = "/flowbee/api/documentos/42/assinaturas/digitais/iniciar";
    const PUBLIC_START: &str = "/flowbee/api/public/documentos/42/assinaturas/digitais/iniciar";
    const PUBLIC_FINISH: &str = "/flowbee/api/public/documentos/42/assinaturas/digitais/finalizar";
    const PRIVATE_FINISH: &str = "/flowbee/api/documentos/42/assinaturas/digitais/finalizar";

    fn start() -> DigitalSignatureStart {
        DigitalSignatureStart {
            certificate: "MIIC...".to_string(),
            document_id: "42".to_string(),
        }
    }

    fn finish() -> DigitalSignatureFinish {
        DigitalSignatureFinish {
            document_id: "42".to_string(),
            signature: "c2lnbg==".to_string(),
            temporary_signature_id: "tmp-1".to_string(),
        }
    }

    fn store(transport: &FakeTransport) -> Store<FakeEngine, FakeTransport> {
        Store::new(FakeEngine::new(), transport.clone(), StoreConfig::default())
    }

    #[tokio::test]
    async fn test_start_without_token() {
        let transport = FakeTransport::new().with_post(PRIVATE_START, json!({"hash": "abc"}));
        let store = store(&transport);

        let data = store.start_digital_signature(&start()).await.unwrap();

        assert_eq!(data, json!({"hash": "abc"}));
        let requests = transport.requests();
        assert_eq!(requests[0].body, Some(RequestBody::Text("MIIC...".to_string())));
        assert_eq!(requests[0].headers.len(), 1);
        assert_eq!(requests[0].headers["Content-Type"], "text/plain");
    }

    #[tokio::test]
    async fn test_start_with_token_uses_public_route() {
        let transport = FakeTransport::new().with_post(PUBLIC_START, json!({}));
        let store = store(&transport);
        let mut token = Headers::new();
        token.insert("X-Access-Token".to_string(), "t0k3n".to_string());
        store.set_access_token(Some(token));

        store.start_digital_signature(&start()).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].url, PUBLIC_START);
        assert_eq!(requests[0].headers["X-Access-Token"], "t0k3n");
        assert_eq!(requests[0].headers["Content-Type"], "text/plain");
    }

    #[tokio::test]
    async fn test_finish_posts_json() {
        let transport = FakeTransport::new().with_post(PRIVATE_FINISH, json!({"status": "ok"}));
        let store = store(&transport);

        store.finish_digital_signature(&finish()).await.unwrap();

        assert_eq!(
            transport.requests()[0].body,
            Some(RequestBody::Json(json!({
                "assinatura": "c2lnbg==",
                "assinaturaTemporariaId": "tmp-1"
            })))
        );
    }

    #[tokio::test]
    async fn test_finish_with_token_uses_public_route() {
        let transport = FakeTransport::new().with_post(PUBLIC_FINISH, json!({}));
        let store = store(&transport);
        store.set_access_token(Some(Headers::new()));

        store.finish_digital_signature(&finish()).await.unwrap();
        assert_eq!(transport.requests()[0].url, PUBLIC_FINISH);
    }

    #[tokio::test]
    async fn test_failures_propagate() {
        let transport = FakeTransport::new().with_post_failure(PRIVATE_START, 403);
        let store = store(&transport);

        let err = store.start_digital_signature(&start()).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Transport(TransportError::Status { status: 403, .. })
        ));
    }
}
