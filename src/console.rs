//! Federated sign-in URL for the AWS Management Console.

/// Federation and console endpoints to use.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub federation_url: url::Url,
    pub console_url: url::Url,
}

impl Endpoints {
    /// Endpoints of the partition `region` belongs to.
    pub fn for_region(region: &str) -> crate::Result<Self> {
        let domain = console_domain(region);
        Ok(Self {
            federation_url: url::Url::parse(&format!("https://signin.{domain}/federation"))?,
            console_url: url::Url::parse(&format!("https://console.{domain}/"))?,
        })
    }

    pub fn from_config(config: &crate::config::Config) -> crate::Result<Self> {
        let defaults = Self::for_region(config.region())?;
        Ok(Self {
            federation_url: config
                .federation_url
                .clone()
                .unwrap_or(defaults.federation_url),
            console_url: config.console_url.clone().unwrap_or(defaults.console_url),
        })
    }
}

fn console_domain(region: &str) -> &'static str {
    match region {
        r if r.starts_with("us-gov-") => "amazonaws-us-gov.com",
        r if r.starts_with("cn-") => "amazonaws.cn",
        _ => "aws.amazon.com",
    }
}

#[derive(serde::Serialize)]
struct SessionCredentials<'a> {
    #[serde(rename = "sessionId")]
    session_id: &'a str,
    #[serde(rename = "sessionKey")]
    session_key: &'a str,
    #[serde(rename = "sessionToken")]
    session_token: &'a str,
}

#[derive(serde::Deserialize)]
struct SigninTokenResponse {
    #[serde(rename = "SigninToken")]
    signin_token: secrecy::SecretString,
}

/// Exchanges `credentials` for a short-lived sign-in token at the federation endpoint.
#[tracing::instrument(skip_all)]
pub async fn get_signin_token(
    endpoints: &Endpoints,
    credentials: &crate::credentials::Credentials,
    proxy_url: Option<&url::Url>,
) -> crate::Result<secrecy::SecretString> {
    use secrecy::ExposeSecret;

    let session = zeroize::Zeroizing::new(serde_json::to_string(&SessionCredentials {
        session_id: &credentials.access_key_id,
        session_key: credentials.secret_access_key.expose_secret(),
        session_token: credentials.session_token.expose_secret(),
    })?);

    // The request URL carries the session; keep it out of errors and logs.
    let mut url = endpoints.federation_url.clone();
    url.query_pairs_mut()
        .append_pair("Action", "getSigninToken")
        .append_pair("Session", &session);

    tracing::debug!(federation_url = %endpoints.federation_url, "requesting signin token");
    let resp = crate::client::http(proxy_url)?
        .get(url)
        .send()
        .await
        .map_err(|e| e.without_url())?;

    let status_code = resp.status();
    if !status_code.is_success() {
        return Err(crate::Error::ApiError {
            url: endpoints.federation_url.clone(),
            status_code,
            message: "failed to get signin token".to_owned(),
        });
    }

    let body = resp.bytes().await.map_err(|e| e.without_url())?;
    let parsed: SigninTokenResponse = serde_json::from_slice(&body).map_err(|e| {
        crate::Error::ParseError(format!("malformed signin token response: {e}"))
    })?;
    Ok(parsed.signin_token)
}

/// Builds the URL that signs the browser into the console with `signin_token`.
pub fn console_url(
    endpoints: &Endpoints,
    signin_token: &secrecy::SecretString,
) -> url::Url {
    use secrecy::ExposeSecret;

    let mut url = endpoints.federation_url.clone();
    url.query_pairs_mut()
        .append_pair("Action", "login")
        .append_pair("Issuer", env!("CARGO_PKG_NAME"))
        .append_pair("Destination", endpoints.console_url.as_str())
        .append_pair("SigninToken", signin_token.expose_secret());
    url
}
