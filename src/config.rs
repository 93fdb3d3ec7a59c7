pub fn config_dir() -> std::path::PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(|x| x.into())
        .unwrap_or_else(|_| {
            std::path::PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_owned()))
                .join(".config")
        })
        .join(env!("CARGO_PKG_NAME"))
}

pub fn config_path() -> std::path::PathBuf {
    std::env::var("ROLECHAIN_CONFIG")
        .map(|x| x.into())
        .unwrap_or_else(|_| config_dir().join("config.json"))
}

pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(serde::Serialize, serde::Deserialize, Clone, Default)]
pub struct Config {
    #[serde(skip)]
    pub config_path: std::path::PathBuf,

    /// Base URL of the role directory service
    pub url: Option<url::Url>,
    /// Trust-anchor role assumed with the bootstrap token
    pub assume_initial_arn: Option<String>,
    pub proxy_url: Option<url::Url>,
    pub region: Option<String>,
    pub sts_endpoint_url: Option<url::Url>,
    pub federation_url: Option<url::Url>,
    pub console_url: Option<url::Url>,
    #[serde(default = "default_token_command")]
    pub token_command: Vec<String>,
    pub session_duration_seconds: Option<i32>,
}

fn default_token_command() -> Vec<String> {
    vec!["ocm".to_owned(), "token".to_owned()]
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("config_path", &self.config_path)
            .field("url", &self.url.as_ref().map(|u| u.as_str()))
            .field("assume_initial_arn", &self.assume_initial_arn)
            .field("proxy_url", &self.proxy_url.as_ref().map(|u| u.as_str()))
            .field("region", &self.region)
            .finish()
    }
}

impl Config {
    /// Loads configuration from [`config_path`], then applies environment overrides.
    /// A missing file yields defaults; [`Config::validate`] reports what is lacking.
    pub async fn load() -> crate::Result<Self> {
        let path = config_path();
        let mut config = if tokio::fs::try_exists(&path).await? {
            Self::read_from_file(&path).await?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Config {
                config_path: path,
                token_command: default_token_command(),
                ..Default::default()
            }
        };
        config.apply_env(|k| std::env::var(k).ok())?;
        Ok(config)
    }

    pub async fn read_from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let data = tokio::fs::read(&path).await.map_err(|e| {
            crate::Error::ConfigError(format!(
                "Can't read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let mut parsed: Self = serde_json::from_slice(&data).map_err(|e| {
            crate::Error::ConfigError(format!(
                "Can't parse {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        parsed.config_path = path.as_ref().into();
        Ok(parsed)
    }

    fn apply_env<F>(&mut self, getenv: F) -> crate::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(u) = getenv("ROLECHAIN_URL").filter(|v| !v.is_empty()) {
            self.url = Some(url::Url::parse(&u)?);
        }
        if let Some(u) = getenv("ROLECHAIN_PROXY_URL").filter(|v| !v.is_empty()) {
            self.proxy_url = Some(url::Url::parse(&u)?);
        }
        Ok(())
    }

    pub fn validate(&self) -> crate::Result<()> {
        self.try_assume_initial_arn()?;
        if self.token_command.is_empty() {
            return Err(crate::Error::ConfigError(format!(
                "{}: token_command must not be empty",
                self.config_path.display()
            )));
        }
        if let Some(d) = self.session_duration_seconds {
            // Chained links are capped further in sts_assume_role
            if !(900..=43200).contains(&d) {
                return Err(crate::Error::ConfigError(format!(
                    "{}: session_duration_seconds must be between 900 and 43200, {} given",
                    self.config_path.display(),
                    d
                )));
            }
        }
        Ok(())
    }

    pub fn try_assume_initial_arn(&self) -> crate::Result<&str> {
        match self.assume_initial_arn.as_deref() {
            Some(arn) if !arn.is_empty() => Ok(arn),
            _ => Err(crate::Error::ConfigError(format!(
                "{} is missing required `assume_initial_arn` property",
                self.config_path.display()
            ))),
        }
    }

    pub fn try_url(&self) -> crate::Result<&url::Url> {
        self.url.as_ref().ok_or_else(|| {
            crate::Error::ConfigError(format!(
                "{} is missing `url` property (or ROLECHAIN_URL) required to look up a role sequence",
                self.config_path.display()
            ))
        })
    }

    #[inline]
    pub fn region(&self) -> &str {
        self.region.as_deref().unwrap_or(DEFAULT_REGION)
    }
}
