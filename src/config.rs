//! Gateway settings for `submit`.
//!
//! Read from the environment (a `.env` file is loaded first when present):
//! `LOANFORM_UPLOAD_URL` with optional `LOANFORM_UPLOAD_PRESET`, or
//! `LOANFORM_UPLOAD_DIR`; `LOANFORM_API_BASE`; optional `LOANFORM_OUTPUT_DIR`.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::gateway::{AssetHost, DirectoryAssetHost, HttpAssetHost, HttpLoanRegistry};

const DEFAULT_UPLOAD_PRESET: &str = "contracts";

/// Where uploaded contracts go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetConfig {
    /// Multipart upload endpoint and its unsigned preset.
    Http { url: String, preset: String },
    /// Local folder standing in for the asset host.
    Directory(PathBuf),
}

/// Settings for `submit`, loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub output_dir: PathBuf,
    pub asset: AssetConfig,
    pub api_base: String,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let asset = match (get("LOANFORM_UPLOAD_URL"), get("LOANFORM_UPLOAD_DIR")) {
            (Some(url), _) => AssetConfig::Http {
                url,
                preset: get("LOANFORM_UPLOAD_PRESET")
                    .unwrap_or_else(|| DEFAULT_UPLOAD_PRESET.to_string()),
            },
            (None, Some(dir)) => AssetConfig::Directory(PathBuf::from(dir)),
            (None, None) => {
                bail!("Set LOANFORM_UPLOAD_URL or LOANFORM_UPLOAD_DIR to choose an asset host")
            }
        };

        Ok(GatewayConfig {
            output_dir: get("LOANFORM_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            asset,
            api_base: get("LOANFORM_API_BASE").with_context(|| {
                "Required environment variable 'LOANFORM_API_BASE' is not set".to_string()
            })?,
        })
    }

    pub fn asset_host(&self) -> Result<Box<dyn AssetHost>> {
        let host: Box<dyn AssetHost> = match &self.asset {
            AssetConfig::Http { url, preset } => Box::new(
                HttpAssetHost::new(url.clone(), preset.clone())
                    .context("Failed to build upload client")?,
            ),
            AssetConfig::Directory(dir) => Box::new(DirectoryAssetHost::new(dir.clone())),
        };
        Ok(host)
    }

    pub fn loan_registry(&self) -> Result<HttpLoanRegistry> {
        HttpLoanRegistry::new(self.api_base.clone()).context("Failed to build loan backend client")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_http_host_with_default_preset() {
        let cfg = GatewayConfig::from_lookup(lookup(&[
            ("LOANFORM_UPLOAD_URL", "https://api.example.com/upload"),
            ("LOANFORM_API_BASE", "http://localhost/ulsa"),
        ]))
        .unwrap();
        assert_eq!(
            cfg.asset,
            AssetConfig::Http {
                url: "https://api.example.com/upload".into(),
                preset: "contracts".into()
            }
        );
        assert_eq!(cfg.output_dir, PathBuf::from("."));
    }

    #[test]
    fn test_directory_host() {
        let cfg = GatewayConfig::from_lookup(lookup(&[
            ("LOANFORM_UPLOAD_DIR", "/tmp/uploads"),
            ("LOANFORM_OUTPUT_DIR", "/tmp/out"),
            ("LOANFORM_API_BASE", "http://localhost/ulsa"),
        ]))
        .unwrap();
        assert_eq!(cfg.asset, AssetConfig::Directory("/tmp/uploads".into()));
        assert_eq!(cfg.output_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_missing_asset_host_is_an_error() {
        let err = GatewayConfig::from_lookup(lookup(&[("LOANFORM_API_BASE", "x")])).unwrap_err();
        assert!(err.to_string().contains("LOANFORM_UPLOAD_URL"));
    }

    #[test]
    fn test_blank_api_base_counts_as_unset() {
        let err = GatewayConfig::from_lookup(lookup(&[
            ("LOANFORM_UPLOAD_DIR", "/tmp/uploads"),
            ("LOANFORM_API_BASE", "  "),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("LOANFORM_API_BASE"));
    }
}
