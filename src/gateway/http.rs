//! Blocking HTTP clients for the asset host and the loan backend.

use std::time::Duration;

use log::{debug, info};
use reqwest::blocking::{multipart, Client, Response};
use serde::Deserialize;

use super::{AssetHost, LoanRegistry, OpenLoanRequest, ReturnLoanRequest};
use crate::error::ContractError;

const TIMEOUT: Duration = Duration::from_secs(60);

fn build_client() -> Result<Client, reqwest::Error> {
    Client::builder().timeout(TIMEOUT).build()
}

/// Reads `status: body` out of a failed response for the error message.
fn describe_failure(response: Response) -> String {
    let status = response.status();
    let body = response.text().unwrap_or_default();
    if body.trim().is_empty() {
        status.to_string()
    } else {
        format!("{}: {}", status, body.trim())
    }
}

#[derive(Debug, Deserialize)]
struct UploadReply {
    secure_url: Option<String>,
}

/// Unsigned multipart upload: `file` plus an `upload_preset`, answered with
/// JSON carrying `secure_url`.
#[derive(Debug, Clone)]
pub struct HttpAssetHost {
    client: Client,
    url: String,
    preset: String,
}

impl HttpAssetHost {
    pub fn new(url: impl Into<String>, preset: impl Into<String>) -> Result<Self, ContractError> {
        let client = build_client().map_err(|e| ContractError::Upload {
            cause: e.to_string(),
        })?;
        Ok(Self {
            client,
            url: url.into(),
            preset: preset.into(),
        })
    }
}

impl AssetHost for HttpAssetHost {
    fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<String, ContractError> {
        let upload_err = |cause: String| ContractError::Upload { cause };

        let part = multipart::Part::bytes(bytes.to_vec())
            .file_name(file_name.to_string())
            .mime_str("application/pdf")
            .map_err(|e| upload_err(e.to_string()))?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("upload_preset", self.preset.clone());

        debug!("Uploading {} ({} bytes) to {}", file_name, bytes.len(), self.url);
        let response = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .map_err(|e| upload_err(e.to_string()))?;

        if !response.status().is_success() {
            return Err(upload_err(describe_failure(response)));
        }

        let reply: UploadReply = response.json().map_err(|e| upload_err(e.to_string()))?;
        let url = reply
            .secure_url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| upload_err("reply has no secure_url".to_string()))?;

        info!("Uploaded {} to {}", file_name, url);
        Ok(url)
    }
}

/// The loan backend's REST endpoints under one base URL.
#[derive(Debug, Clone)]
pub struct HttpLoanRegistry {
    client: Client,
    base_url: String,
}

impl HttpLoanRegistry {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ContractError> {
        let client = build_client().map_err(|e| ContractError::Registry {
            cause: e.to_string(),
        })?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn check(response: reqwest::Result<Response>) -> Result<(), ContractError> {
        let response = response.map_err(|e| ContractError::Registry {
            cause: e.to_string(),
        })?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(ContractError::Registry {
                cause: describe_failure(response),
            })
        }
    }
}

impl LoanRegistry for HttpLoanRegistry {
    fn open_loan(&self, request: &OpenLoanRequest) -> Result<(), ContractError> {
        let url = self.endpoint("loanObject");
        debug!("POST {} for object {}", url, request.ceiit_id);
        Self::check(self.client.post(&url).form(request).send())?;
        info!("Registered loan of {} to {}", request.ceiit_id, request.user_id);
        Ok(())
    }

    fn return_loan(&self, request: &ReturnLoanRequest) -> Result<(), ContractError> {
        let url = self.endpoint("returnLoan");
        debug!("POST {} for loan {}", url, request.loan_id);
        Self::check(self.client.post(&url).json(request).send())?;
        info!("Registered return of loan {}", request.loan_id);
        Ok(())
    }
}
