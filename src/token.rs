/// Identity provider token presented once to obtain seed credentials.
#[derive(Clone)]
pub struct BootstrapToken(secrecy::SecretString);

impl std::fmt::Debug for BootstrapToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BootstrapToken(..)")
    }
}

impl From<String> for BootstrapToken {
    fn from(s: String) -> BootstrapToken {
        BootstrapToken(s.into())
    }
}

impl BootstrapToken {
    pub fn secret(&self) -> &secrecy::SecretString {
        &self.0
    }

    /// Extracts a string claim from the (unverified) JWT payload.
    pub fn string_claim(&self, name: &str) -> crate::Result<String> {
        use base64::Engine;
        use secrecy::ExposeSecret;

        let mut parts = self.0.expose_secret().split('.');
        let payload = match (parts.next(), parts.next(), parts.next()) {
            (Some(_), Some(p), Some(_)) => p,
            _ => {
                return Err(crate::Error::ParseError(
                    "token is not a JWT (expected three dot-separated segments)".to_owned(),
                ))
            }
        };
        let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| crate::Error::ParseError(format!("token payload is not base64url: {e}")))?;
        let claims: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(&decoded)
            .map_err(|e| crate::Error::ParseError(format!("token payload is not JSON: {e}")))?;
        match claims.get(name) {
            Some(serde_json::Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(crate::Error::ParseError(format!(
                "token claim '{name}' is not a string"
            ))),
            None => Err(crate::Error::ParseError(format!(
                "token has no '{name}' claim"
            ))),
        }
    }

    pub fn email(&self) -> crate::Result<String> {
        self.string_claim("email")
    }
}

/// Where the bootstrap token comes from.
#[allow(async_fn_in_trait)]
pub trait TokenSource {
    async fn bootstrap_token(&self) -> crate::Result<BootstrapToken>;
}

/// Uses `ROLECHAIN_TOKEN` when set, otherwise runs a command and reads the token from its stdout.
#[derive(Debug, Clone)]
pub struct CommandTokenSource {
    pub env_token: Option<String>,
    pub command: Vec<String>,
}

impl CommandTokenSource {
    pub fn from_env(command: Vec<String>) -> Self {
        Self {
            env_token: std::env::var("ROLECHAIN_TOKEN")
                .ok()
                .filter(|t| !t.is_empty()),
            command,
        }
    }
}

impl TokenSource for CommandTokenSource {
    #[tracing::instrument(skip_all)]
    async fn bootstrap_token(&self) -> crate::Result<BootstrapToken> {
        if let Some(t) = self.env_token.as_ref() {
            tracing::debug!("using bootstrap token from ROLECHAIN_TOKEN");
            return Ok(BootstrapToken::from(t.trim().to_owned()));
        }

        let Some((arg0, rest)) = self.command.split_first() else {
            return Err(crate::Error::ConfigError(
                "token_command must not be empty".to_owned(),
            ));
        };
        tracing::debug!(command = ?self.command, "running token command");
        let output = tokio::process::Command::new(arg0)
            .args(rest)
            .stdin(std::process::Stdio::null())
            .stderr(std::process::Stdio::inherit())
            .output()
            .await
            .map_err(|e| crate::Error::UserError(format!("failed to run {arg0}: {e}")))?;
        if !output.status.success() {
            return Err(crate::Error::UserError(format!(
                "{arg0} exited with {}",
                output.status
            )));
        }
        let token = zeroize::Zeroizing::new(output.stdout);
        let token = std::str::from_utf8(&token)
            .map_err(|_| crate::Error::ParseError(format!("{arg0} printed a non-UTF-8 token")))?
            .trim();
        if token.is_empty() {
            return Err(crate::Error::UserError(format!("{arg0} printed no token")));
        }
        Ok(BootstrapToken::from(token.to_owned()))
    }
}

#[cfg(test)]
pub(crate) fn jwt_with_claims(claims: serde_json::Value) -> BootstrapToken {
    use base64::Engine;
    let b64 = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    BootstrapToken::from(format!(
        "{}.{}.{}",
        b64.encode(br#"{"alg":"RS256","typ":"JWT"}"#),
        b64.encode(claims.to_string()),
        b64.encode(b"signature"),
    ))
}
