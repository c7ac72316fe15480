//! Parsing for `Key=Value;...` storage connection strings.

use super::StorageError;

const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

/// Blob endpoint and credential extracted from a connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    /// Base URL of the blob service, without a trailing slash.
    pub blob_endpoint: String,
    /// Shared access signature query string, without the leading `?`.
    pub sas_token: String,
}

impl ConnectionString {
    /// Parse a connection string.
    ///
    /// `BlobEndpoint` wins when present; otherwise the endpoint is derived from
    /// `DefaultEndpointsProtocol`, `AccountName`, and `EndpointSuffix`. A
    /// `SharedAccessSignature` entry is required.
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        let mut blob_endpoint = None;
        let mut protocol = None;
        let mut account = None;
        let mut suffix = None;
        let mut sas = None;
        let mut has_account_key = false;

        for entry in raw
            .split(';')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
        {
            let (key, value) = entry.split_once('=').ok_or_else(|| {
                StorageError::InvalidConnectionString("entry without '=' separator".into())
            })?;
            let value = value.trim();
            match key.trim() {
                "BlobEndpoint" => blob_endpoint = Some(value.trim_end_matches('/').to_string()),
                "DefaultEndpointsProtocol" => protocol = Some(value.to_string()),
                "AccountName" => account = Some(value.to_string()),
                "EndpointSuffix" => suffix = Some(value.to_string()),
                "SharedAccessSignature" => sas = Some(value.trim_start_matches('?').to_string()),
                "AccountKey" => has_account_key = true,
                _ => {}
            }
        }

        let blob_endpoint = match (blob_endpoint, account) {
            (Some(endpoint), _) => endpoint,
            (None, Some(account)) => format!(
                "{}://{}.blob.{}",
                protocol.as_deref().unwrap_or("https"),
                account,
                suffix.as_deref().unwrap_or(DEFAULT_ENDPOINT_SUFFIX)
            ),
            (None, None) => {
                return Err(StorageError::InvalidConnectionString(
                    "expected BlobEndpoint or AccountName".into(),
                ));
            }
        };

        let sas_token = match sas {
            Some(token) if !token.is_empty() => token,
            _ if has_account_key => {
                return Err(StorageError::InvalidConnectionString(
                    "AccountKey credentials are not supported; provide SharedAccessSignature"
                        .into(),
                ));
            }
            _ => {
                return Err(StorageError::InvalidConnectionString(
                    "missing SharedAccessSignature".into(),
                ));
            }
        };

        Ok(Self {
            blob_endpoint,
            sas_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_blob_endpoint_is_used_verbatim() {
        let parsed = ConnectionString::parse(
            "BlobEndpoint=https://acct.blob.core.windows.net/;SharedAccessSignature=sv=2022-11-02&sig=abc%3D",
        )
        .expect("parsed");
        assert_eq!(parsed.blob_endpoint, "https://acct.blob.core.windows.net");
        assert_eq!(parsed.sas_token, "sv=2022-11-02&sig=abc%3D");
    }

    #[test]
    fn endpoint_is_derived_from_account_name() {
        let parsed = ConnectionString::parse(
            "DefaultEndpointsProtocol=https;AccountName=docs;EndpointSuffix=core.chinacloudapi.cn;SharedAccessSignature=?sv=1&sig=x==",
        )
        .expect("parsed");
        assert_eq!(
            parsed.blob_endpoint,
            "https://docs.blob.core.chinacloudapi.cn"
        );
        assert_eq!(parsed.sas_token, "sv=1&sig=x==");
    }

    #[test]
    fn account_key_only_is_rejected_with_hint() {
        let error = ConnectionString::parse(
            "DefaultEndpointsProtocol=https;AccountName=docs;AccountKey=c2VjcmV0",
        )
        .unwrap_err();
        assert!(error.to_string().contains("SharedAccessSignature"));
    }

    #[test]
    fn missing_endpoint_is_rejected() {
        let error = ConnectionString::parse("SharedAccessSignature=sv=1").unwrap_err();
        assert!(matches!(error, StorageError::InvalidConnectionString(_)));
    }
}
