//! Upload and product metadata actions

use chrono::Utc;
use serde_json::Value;
use viewer_core::{
    FormPart, Headers, RenderEngine, RequestBody, TransferProgress, Transport, TransportError,
};

use crate::error::StoreError;
use crate::mutation::Mutation;
use crate::store::Store;

#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    /// Server record, with `name` set to the uploaded filename
    Uploaded(Value),
    /// The progress entry under `hash` is marked errored
    Failed { hash: String, error: TransportError },
}

impl UploadOutcome {
    pub fn is_uploaded(&self) -> bool {
        matches!(self, UploadOutcome::Uploaded(_))
    }
}

/// Progress key for one upload: filename followed by epoch millis
pub fn upload_hash(filename: &str, epoch_millis: i64) -> String {
    format!("{}{}", filename, epoch_millis)
}

impl<E: RenderEngine, T: Transport> Store<E, T> {
    /// Post `form` to the upload endpoint, tracking progress under a fresh hash
    ///
    /// Transport failures are recorded on the progress entry and returned as
    /// `UploadOutcome::Failed`, so one failed upload never aborts another.
    pub async fn upload_file(
        &self,
        filename: &str,
        form: Vec<FormPart>,
    ) -> Result<UploadOutcome, StoreError> {
        let api = self
            .state()
            .file
            .api
            .clone()
            .ok_or(StoreError::NotConfigured("file_api"))?;
        let hash = upload_hash(filename, Utc::now().timestamp_millis());

        let progress = |percent: u8| Mutation::SetUploadFileProgress {
            hash: hash.clone(),
            filename: filename.to_string(),
            progress: percent,
        };
        self.commit(progress(0));

        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), "multipart/form-data".to_string());
        let on_progress = |event: TransferProgress| self.commit(progress(event.percent()));
        let response = self
            .transport
            .post_with_progress(&api, RequestBody::Multipart(form), &headers, &on_progress)
            .await;

        match response {
            Ok(mut data) => {
                if let Value::Object(record) = &mut data {
                    record.insert("name".to_string(), Value::from(filename));
                }
                let mut uploaded = data.clone();
                if let Value::Object(record) = &mut uploaded {
                    record.insert("status".to_string(), Value::from("success"));
                }
                self.commit(Mutation::RemoveUploadFileProgress(hash));
                self.commit(Mutation::AddUploadedFile(uploaded));
                tracing::info!("Uploaded {}", filename);
                Ok(UploadOutcome::Uploaded(data))
            }
            Err(error) => {
                tracing::warn!("Upload of {} failed: {}", filename, error);
                self.commit(Mutation::SetUploadFileProgressError(hash.clone()));
                Ok(UploadOutcome::Failed { hash, error })
            }
        }
    }

    /// Fetch the product record and publish its extended attributes
    pub async fn get_product(&self) -> Result<Value, StoreError> {
        let params: Vec<(String, String)> = self
            .state()
            .product_name
            .iter()
            .map(|name| ("productName".to_string(), name.clone()))
            .collect();

        let data = self
            .transport
            .get(&self.config.product_endpoint, &params)
            .await?;
        let attrs = data.get("atributosExtendidos").cloned().unwrap_or(Value::Null);
        self.commit(Mutation::SetProductExtendedAttrs(attrs.clone()));
        Ok(attrs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use viewer_core::testing::{FakeEngine, FakeTransport};

    fn config() -> StoreConfig {
        StoreConfig {
            file_api: Some("api/arquivos".to_string()),
            product_name: Some("flowbee".to_string()),
            ..StoreConfig::default()
        }
    }

    fn form() -> Vec<FormPart> {
        vec![FormPart::file("file", "contract.pdf", b"%PDF-1.7".to_vec())]
    }

    #[test]
    fn test_upload_hash() {
        assert_eq!(upload_hash("a.pdf", 1700000000000), "a.pdf1700000000000");
    }

    #[tokio::test]
    async fn test_upload_success_records_file() {
        let transport = FakeTransport::new()
            .with_post("api/arquivos", json!({"id": 7}))
            .with_progress(&[(50, 200), (200, 200)]);
        let store = Store::new(FakeEngine::new(), transport.clone(), config());

        let outcome = store.upload_file("contract.pdf", form()).await.unwrap();

        assert_eq!(outcome, UploadOutcome::Uploaded(json!({"id": 7, "name": "contract.pdf"})));
        let state = store.snapshot();
        assert!(state.upload_progress.is_empty());
        assert_eq!(
            state.uploaded_files,
            vec![json!({"id": 7, "name": "contract.pdf", "status": "success"})]
        );
        let requests = transport.requests();
        assert_eq!(requests[0].headers["Content-Type"], "multipart/form-data");
    }

    #[tokio::test]
    async fn test_upload_failure_marks_entry() {
        let transport = FakeTransport::new()
            .with_post_failure("api/arquivos", 500)
            .with_progress(&[(1, 3)]);
        let store = Store::new(FakeEngine::new(), transport, config());

        let outcome = store.upload_file("contract.pdf", form()).await.unwrap();

        let UploadOutcome::Failed { hash, .. } = outcome else {
            panic!("expected failure");
        };
        let entry = store.state().upload_progress[&hash].clone();
        assert!(entry.error);
        assert_eq!(entry.progress, 33);
        assert_eq!(entry.filename, "contract.pdf");
        assert!(hash.starts_with("contract.pdf"));
        assert!(store.state().uploaded_files.is_empty());
    }

    #[tokio::test]
    async fn test_upload_requires_endpoint() {
        let store = Store::new(FakeEngine::new(), FakeTransport::new(), StoreConfig::default());
        let err = store.upload_file("a.pdf", form()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotConfigured("file_api")));
    }

    #[tokio::test]
    async fn test_get_product_commits_attrs() {
        let transport = FakeTransport::new().with_get(
            "public/produtos",
            json!({"nome": "flowbee", "atributosExtendidos": {"tema": "escuro"}}),
        );
        let store = Store::new(FakeEngine::new(), transport.clone(), config());

        store.get_product().await.unwrap();

        assert_eq!(store.state().product_extended_attrs, json!({"tema": "escuro"}));
        assert_eq!(
            transport.requests()[0].params,
            vec![("productName".to_string(), "flowbee".to_string())]
        );
    }

    #[tokio::test]
    async fn test_get_product_failure_propagates() {
        let store = Store::new(FakeEngine::new(), FakeTransport::new(), config());
        let err = store.get_product().await.unwrap_err();
        assert!(matches!(err, StoreError::Transport(TransportError::Status { status: 404, .. })));
    }
}
