//! Temporary AWS credentials passed along the role chain.

/// Credentials issued by a single trust exchange. Never persisted.
#[derive(Clone)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: secrecy::SecretString,
    pub session_token: secrecy::SecretString,
    pub expiration: chrono::DateTime<chrono::Utc>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("expiration", &self.expiration)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: impl Into<String>,
        expiration: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        let secret_access_key: String = secret_access_key.into();
        let session_token: String = session_token.into();
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: session_token.into(),
            expiration,
        }
    }

    /// Returns None when STS hands back an expiration chrono can't represent.
    pub(crate) fn from_sts(creds: &aws_sdk_sts::types::Credentials) -> Option<Self> {
        let exp = creds.expiration();
        let expiration = chrono::DateTime::from_timestamp(exp.secs(), exp.subsec_nanos())?;
        Some(Self::new(
            creds.access_key_id(),
            creds.secret_access_key(),
            creds.session_token(),
            expiration,
        ))
    }
}

impl From<&Credentials> for aws_sdk_sts::config::Credentials {
    fn from(credentials: &Credentials) -> aws_sdk_sts::config::Credentials {
        use secrecy::ExposeSecret;
        aws_sdk_sts::config::Credentials::new(
            &credentials.access_key_id,
            credentials.secret_access_key.expose_secret(),
            Some(credentials.session_token.expose_secret().to_owned()),
            Some(credentials.expiration.into()),
            "rolechain-chain",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_hides_secrets() {
        let creds = Credentials::new(
            "ASIAEXAMPLE",
            "supersecretkey",
            "supersecrettoken",
            chrono::Utc::now(),
        );
        let s = format!("{creds:?}");
        assert!(s.contains("ASIAEXAMPLE"));
        assert!(!s.contains("supersecretkey"));
        assert!(!s.contains("supersecrettoken"));
    }

    #[test]
    fn into_sdk_credentials() {
        let expiration = chrono::DateTime::from_timestamp(1_900_000_000, 0).unwrap();
        let creds = Credentials::new("ASIAEXAMPLE", "key", "token", expiration);
        let sdk = aws_sdk_sts::config::Credentials::from(&creds);
        assert_eq!(sdk.access_key_id(), "ASIAEXAMPLE");
        assert_eq!(sdk.secret_access_key(), "key");
        assert_eq!(sdk.session_token(), Some("token"));
        assert_eq!(sdk.expiry(), Some(std::time::SystemTime::from(expiration)));
    }
}
