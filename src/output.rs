#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Env,
    Json,
    Yaml,
}

impl std::str::FromStr for OutputFormat {
    type Err = crate::Error;
    fn from_str(s: &str) -> Result<OutputFormat, crate::Error> {
        match s {
            "env" => Ok(OutputFormat::Env),
            "json" => Ok(OutputFormat::Json),
            "yaml" => Ok(OutputFormat::Yaml),
            _ => Err(crate::Error::RenderError(format!(
                "unsupported output format '{s}'; valid values are env, json and yaml"
            ))),
        }
    }
}

/// What a single invocation prints. Console and credentials output never mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Console,
    Credentials(OutputFormat),
}

#[derive(Clone, Debug, serde::Serialize, zeroize::ZeroizeOnDrop)]
pub struct CredentialsResponse {
    #[serde(rename = "AccessKeyId")]
    pub access_key_id: String,
    #[serde(rename = "SecretAccessKey")]
    pub secret_access_key: String,
    #[serde(rename = "SessionToken")]
    pub session_token: String,
    #[serde(rename = "Region")]
    pub region: String,
    #[serde(rename = "Expiration")]
    pub expiration: String,
}

impl CredentialsResponse {
    pub fn new(credentials: &crate::credentials::Credentials, region: &str) -> Self {
        use secrecy::ExposeSecret;
        CredentialsResponse {
            access_key_id: credentials.access_key_id.clone(),
            secret_access_key: credentials.secret_access_key.expose_secret().to_owned(),
            session_token: credentials.session_token.expose_secret().to_owned(),
            region: region.to_owned(),
            expiration: credentials.expiration.to_rfc3339(),
        }
    }

    pub fn render(&self, format: OutputFormat) -> crate::Result<String> {
        match format {
            OutputFormat::Env => Ok(indoc::formatdoc! {"
                export AWS_ACCESS_KEY_ID={access_key_id}
                export AWS_SECRET_ACCESS_KEY={secret_access_key}
                export AWS_SESSION_TOKEN={session_token}
                export AWS_DEFAULT_REGION={region}
                export AWS_CREDENTIAL_EXPIRATION={expiration}",
                access_key_id = self.access_key_id,
                secret_access_key = self.secret_access_key,
                session_token = self.session_token,
                region = self.region,
                expiration = self.expiration,
            }),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(self)?.trim_end().to_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response() -> CredentialsResponse {
        let creds = crate::credentials::Credentials::new(
            "ASIAFINAL",
            "finalsecret",
            "finaltoken",
            chrono::DateTime::from_timestamp(1_900_000_000, 0).unwrap(),
        );
        CredentialsResponse::new(&creds, "us-east-1")
    }

    #[test]
    fn parse_format() {
        use std::str::FromStr;
        assert_eq!(OutputFormat::from_str("env").unwrap(), OutputFormat::Env);
        assert_eq!(OutputFormat::from_str("json").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str("yaml").unwrap(), OutputFormat::Yaml);
        assert!(matches!(
            OutputFormat::from_str("xml"),
            Err(crate::Error::RenderError(_))
        ));
    }

    #[test]
    fn env() {
        let out = response().render(OutputFormat::Env).unwrap();
        assert_eq!(
            out,
            "export AWS_ACCESS_KEY_ID=ASIAFINAL\n\
             export AWS_SECRET_ACCESS_KEY=finalsecret\n\
             export AWS_SESSION_TOKEN=finaltoken\n\
             export AWS_DEFAULT_REGION=us-east-1\n\
             export AWS_CREDENTIAL_EXPIRATION=2030-03-17T17:46:40+00:00"
        );
    }

    #[test]
    fn json() {
        let out = response().render(OutputFormat::Json).unwrap();
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["AccessKeyId"], "ASIAFINAL");
        assert_eq!(v["SecretAccessKey"], "finalsecret");
        assert_eq!(v["SessionToken"], "finaltoken");
        assert_eq!(v["Region"], "us-east-1");
        assert_eq!(v["Expiration"], "2030-03-17T17:46:40+00:00");
    }

    #[test]
    fn yaml() {
        let out = response().render(OutputFormat::Yaml).unwrap();
        assert!(out.contains("AccessKeyId: ASIAFINAL"));
        assert!(out.contains("SessionToken: finaltoken"));
        assert!(!out.ends_with('\n'));
    }
}
