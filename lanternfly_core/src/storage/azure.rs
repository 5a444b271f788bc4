//! Azure Blob Storage wiring: connection-string parsing and construction of a
//! [`ContainerClient`] from the storage configuration.

use std::str::FromStr;
use std::sync::Arc;

use object_store::azure::{AzureConfigKey, MicrosoftAzureBuilder};
use tracing::{info, warn};

use super::{ContainerClient, StoreError};
use crate::config::StorageConfig;

const EMULATOR_BLOB_ENDPOINT: &str = "http://127.0.0.1:10000/devstoreaccount1";

/// The subset of an Azure storage connection string this service understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    pub account_name: Option<String>,
    pub account_key: Option<String>,
    pub sas_token: Option<String>,
    pub blob_endpoint: Option<String>,
    pub protocol: String,
    pub endpoint_suffix: String,
    pub use_emulator: bool,
}

impl Default for ConnectionString {
    fn default() -> Self {
        Self {
            account_name: None,
            account_key: None,
            sas_token: None,
            blob_endpoint: None,
            protocol: "https".to_string(),
            endpoint_suffix: "core.windows.net".to_string(),
            use_emulator: false,
        }
    }
}

impl FromStr for ConnectionString {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parsed = ConnectionString::default();

        for segment in s.split(';').map(str::trim).filter(|seg| !seg.is_empty()) {
            // Values may themselves contain '=' (base64 keys, SAS tokens).
            let (key, value) = segment.split_once('=').ok_or_else(|| {
                StoreError::Config(format!("malformed connection string segment '{}'", segment))
            })?;
            let value = value.trim().to_string();

            match key.trim().to_ascii_lowercase().as_str() {
                "accountname" => parsed.account_name = Some(value),
                "accountkey" => parsed.account_key = Some(value),
                "sharedaccesssignature" => parsed.sas_token = Some(value),
                "blobendpoint" => parsed.blob_endpoint = Some(value),
                "defaultendpointsprotocol" => parsed.protocol = value,
                "endpointsuffix" => parsed.endpoint_suffix = value,
                "usedevelopmentstorage" => parsed.use_emulator = value.eq_ignore_ascii_case("true"),
                _ => {}
            }
        }

        if !parsed.use_emulator && parsed.account_name.is_none() && parsed.blob_endpoint.is_none() {
            return Err(StoreError::Config(
                "connection string has neither AccountName nor BlobEndpoint".to_string(),
            ));
        }

        Ok(parsed)
    }
}

impl ConnectionString {
    pub fn blob_endpoint(&self) -> Result<String, StoreError> {
        if let Some(endpoint) = &self.blob_endpoint {
            return Ok(endpoint.trim_end_matches('/').to_string());
        }

        if self.use_emulator {
            return Ok(EMULATOR_BLOB_ENDPOINT.to_string());
        }

        let account = self.account_name.as_deref().ok_or_else(|| {
            StoreError::Config("connection string has no AccountName".to_string())
        })?;

        Ok(format!(
            "{}://{}.blob.{}",
            self.protocol, account, self.endpoint_suffix
        ))
    }

    /// Account name, falling back to the one embedded in `BlobEndpoint`.
    fn account(&self) -> Result<String, StoreError> {
        match &self.account_name {
            Some(name) => Ok(name.clone()),
            None => account_from_url(&self.blob_endpoint()?),
        }
    }

    pub fn container_url(&self, container: &str) -> Result<String, StoreError> {
        Ok(format!("{}/{}", self.blob_endpoint()?, container))
    }
}

/// Extracts the account name from either a virtual-host style URL
/// (`https://acct.blob.core.windows.net`) or a path style one
/// (`http://127.0.0.1:10000/acct`).
fn account_from_url(url: &str) -> Result<String, StoreError> {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let (host, path) = match without_scheme.split_once('/') {
        Some((host, path)) => (host, path),
        None => (without_scheme, ""),
    };

    let path_account = path.split('/').find(|part| !part.is_empty());
    let host_name = host.split(':').next().unwrap_or(host);
    let is_ip = host_name.parse::<std::net::IpAddr>().is_ok() || host_name == "localhost";

    let account = match path_account {
        Some(account) if is_ip => account,
        _ => host_name.split('.').next().unwrap_or_default(),
    };

    if account.is_empty() {
        return Err(StoreError::Config(format!(
            "cannot derive a storage account name from '{}'",
            url
        )));
    }

    Ok(account.to_string())
}

pub fn from_connection_string(
    connection_string: &str,
    container: &str,
) -> Result<ContainerClient, StoreError> {
    let parsed: ConnectionString = connection_string.parse()?;
    let endpoint = parsed.blob_endpoint()?;

    let mut builder = MicrosoftAzureBuilder::new().with_container_name(container);

    if parsed.use_emulator && parsed.blob_endpoint.is_none() {
        builder = builder.with_use_emulator(true);
    } else {
        builder = builder
            .with_account(parsed.account()?)
            .with_endpoint(endpoint.clone())
            .with_allow_http(endpoint.starts_with("http://"));

        builder = match (&parsed.account_key, &parsed.sas_token) {
            (Some(key), _) => builder.with_access_key(key),
            (None, Some(sas)) => builder.with_config(AzureConfigKey::SasKey, sas),
            (None, None) => {
                return Err(StoreError::Config(
                    "connection string carries neither AccountKey nor SharedAccessSignature"
                        .to_string(),
                ))
            }
        };
    }

    let store = builder.build()?;

    Ok(ContainerClient::new(
        Arc::new(store),
        container,
        parsed.container_url(container)?,
    ))
}

/// Builds an unsigned client; only anonymous operations (such as listing a
/// public container) will succeed.
pub fn from_account_url(account_url: &str, container: &str) -> Result<ContainerClient, StoreError> {
    let endpoint = account_url.trim_end_matches('/');

    let store = MicrosoftAzureBuilder::new()
        .with_account(account_from_url(endpoint)?)
        .with_container_name(container)
        .with_endpoint(endpoint.to_string())
        .with_allow_http(endpoint.starts_with("http://"))
        .with_skip_signature(true)
        .build()?;

    Ok(ContainerClient::new(
        Arc::new(store),
        container,
        format!("{}/{}", endpoint, container),
    ))
}

/// Connects using the connection string when present, else the account URL.
pub fn connect(config: &StorageConfig) -> Result<ContainerClient, StoreError> {
    if let Some(connection_string) = &config.connection_string {
        let client = from_connection_string(connection_string, &config.container)?;
        info!("Using connection string credentials for container {}", config.container);
        return Ok(client);
    }

    if let Some(account_url) = &config.account_url {
        warn!(
            "Using anonymous access to {} - uploads require a connection string",
            account_url
        );
        return from_account_url(account_url, &config.container);
    }

    Err(StoreError::Config(
        "Missing storage configuration. Set AZURE_STORAGE_CONNECTION_STRING or STORAGE_ACCOUNT_URL."
            .to_string(),
    ))
}
