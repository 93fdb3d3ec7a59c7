/// Client for the role directory, which knows the assume-role sequence leading to a target
/// account.
pub struct Client {
    pub url: url::Url,
    bearer_token: secrecy::SecretString,
    http: reqwest::Client,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("url", &self.url.as_str())
            .finish()
    }
}

impl Client {
    pub fn new(
        url: url::Url,
        token: &crate::token::BootstrapToken,
        proxy_url: Option<&url::Url>,
    ) -> crate::Result<Self> {
        Ok(Self {
            url,
            bearer_token: token.secret().clone(),
            http: crate::client::http(proxy_url)?,
        })
    }
}

/// Looks up the ordered role sequence for a resolved target identifier.
#[allow(async_fn_in_trait)]
pub trait SequenceLookup {
    async fn assume_role_sequence(&self, target: &str) -> crate::Result<Vec<String>>;
}

impl<T: SequenceLookup> SequenceLookup for &T {
    async fn assume_role_sequence(&self, target: &str) -> crate::Result<Vec<String>> {
        (**self).assume_role_sequence(target).await
    }
}

impl SequenceLookup for Client {
    #[tracing::instrument]
    async fn assume_role_sequence(&self, target: &str) -> crate::Result<Vec<String>> {
        use secrecy::ExposeSecret;

        let mut url = self.url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                crate::Error::ConfigError(format!("url '{}' cannot be a base", self.url))
            })?
            .pop_if_empty()
            .extend(&["backplane", "cloud", "assume-role-sequence", target]);

        tracing::debug!(url = %url, "requesting");
        let resp = self
            .http
            .get(url.clone())
            .bearer_auth(self.bearer_token.expose_secret())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status_code = resp.status();
        // Read the whole body before deciding anything about it
        let body = resp.bytes().await?;

        if !status_code.is_success() {
            let message = String::from_utf8_lossy(&body).trim().to_owned();
            tracing::error!(url = %url, status_code = ?status_code, "assume-role-sequence response was not ok");
            return Err(crate::Error::ApiError {
                url,
                status_code,
                message: format!("failed to fetch assume-role sequence: {message}"),
            });
        }

        let sequence = parse_assume_role_sequence(&body)?;
        tracing::debug!(url = %url, sequence = ?sequence, "response");
        Ok(sequence)
    }
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssumeChainResponse {
    assumption_sequence: Vec<NamedRoleArn>,
}

#[derive(Debug, serde::Deserialize)]
struct NamedRoleArn {
    #[allow(dead_code)]
    #[serde(default)]
    name: String,
    arn: String,
}

/// Extracts role ARNs, in order, from `{"assumptionSequence": [{"name", "arn"}, ...]}`.
pub fn parse_assume_role_sequence(body: &[u8]) -> crate::Result<Vec<String>> {
    let parsed: AssumeChainResponse = serde_json::from_slice(body).map_err(|e| {
        crate::Error::ParseError(format!("malformed assume-role sequence response: {e}"))
    })?;
    Ok(parsed
        .assumption_sequence
        .into_iter()
        .map(|r| r.arn)
        .collect())
}
