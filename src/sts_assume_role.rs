//! STS-backed trust exchanges: AssumeRoleWithWebIdentity for the seed, AssumeRole for each link.

/// Builds STS clients for one region, optionally against a custom endpoint.
#[derive(Debug, Clone)]
pub struct StsExchangerFactory {
    pub region: String,
    pub endpoint_url: Option<url::Url>,
    pub duration_seconds: Option<i32>,
}

impl StsExchangerFactory {
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            region: config.region().to_owned(),
            endpoint_url: config.sts_endpoint_url.clone(),
            duration_seconds: config.session_duration_seconds,
        }
    }

    fn sts_config_builder(
        &self,
        proxy_url: Option<&url::Url>,
    ) -> crate::Result<aws_sdk_sts::config::Builder> {
        let http = crate::ext_smithy::ReqwestHttpClient::new(crate::client::http(proxy_url)?);
        let mut builder = aws_sdk_sts::Config::builder()
            .behavior_version(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(self.region.clone()))
            // Retrying a link is the caller's decision, not the SDK's
            .retry_config(aws_config::retry::RetryConfig::disabled())
            .http_client(http);
        if let Some(endpoint) = self.endpoint_url.as_ref() {
            builder = builder.endpoint_url(endpoint.as_str());
        }
        Ok(builder)
    }
}

impl crate::client::ExchangerFactory for StsExchangerFactory {
    type Exchanger = StsExchanger;

    async fn anonymous(&self, proxy_url: Option<&url::Url>) -> crate::Result<StsExchanger> {
        let config = self.sts_config_builder(proxy_url)?.build();
        Ok(StsExchanger {
            sts: aws_sdk_sts::Client::from_conf(config),
            duration_seconds: self.duration_seconds,
        })
    }

    async fn from_credentials(
        &self,
        credentials: &crate::credentials::Credentials,
        proxy_url: Option<&url::Url>,
    ) -> crate::Result<StsExchanger> {
        let creds = aws_sdk_sts::config::Credentials::from(credentials);
        let config = self
            .sts_config_builder(proxy_url)?
            // Disable cache to always use the provided credentials
            .identity_cache(aws_config::identity::IdentityCache::no_cache())
            .credentials_provider(creds)
            .build();
        Ok(StsExchanger {
            sts: aws_sdk_sts::Client::from_conf(config),
            duration_seconds: self.duration_seconds,
        })
    }
}

#[derive(Debug, Clone)]
pub struct StsExchanger {
    sts: aws_sdk_sts::Client,
    duration_seconds: Option<i32>,
}

impl crate::client::TrustExchanger for StsExchanger {
    async fn assume_role(
        &self,
        role_arn: &str,
        session_name: &str,
    ) -> crate::Result<crate::credentials::Credentials> {
        check_session_name(session_name)?;
        tracing::debug!(
            role_arn = role_arn,
            session_name = session_name,
            "Performing AssumeRole"
        );

        let resp = self
            .sts
            .assume_role()
            .role_arn(role_arn)
            .role_session_name(session_name)
            .set_duration_seconds(chained_duration_seconds(self.duration_seconds))
            .send()
            .await
            .map_err(|e| sdk_error_to_crate_error("AssumeRole", role_arn, e))?;

        let creds = credentials_from_output(resp.credentials(), "AssumeRole", role_arn)?;
        tracing::debug!(
            role_arn = role_arn,
            access_key_id = creds.access_key_id,
            expiration = ?creds.expiration,
            "AssumeRole completed successfully"
        );
        Ok(creds)
    }

    async fn assume_role_with_web_identity(
        &self,
        token: &crate::token::BootstrapToken,
        role_arn: &str,
        session_name: &str,
    ) -> crate::Result<crate::credentials::Credentials> {
        use secrecy::ExposeSecret;

        check_session_name(session_name)?;
        tracing::debug!(
            role_arn = role_arn,
            session_name = session_name,
            "Performing AssumeRoleWithWebIdentity"
        );

        let resp = self
            .sts
            .assume_role_with_web_identity()
            .role_arn(role_arn)
            .role_session_name(session_name)
            .web_identity_token(token.secret().expose_secret())
            .set_duration_seconds(self.duration_seconds)
            .send()
            .await
            .map_err(|e| sdk_error_to_crate_error("AssumeRoleWithWebIdentity", role_arn, e))?;

        let creds =
            credentials_from_output(resp.credentials(), "AssumeRoleWithWebIdentity", role_arn)?;
        tracing::debug!(
            role_arn = role_arn,
            access_key_id = creds.access_key_id,
            expiration = ?creds.expiration,
            "AssumeRoleWithWebIdentity completed successfully"
        );
        Ok(creds)
    }
}

/// STS rejects `DurationSeconds` above one hour for AssumeRole called with role credentials.
pub const MAX_CHAINED_DURATION_SECONDS: i32 = 3600;

fn chained_duration_seconds(duration_seconds: Option<i32>) -> Option<i32> {
    match duration_seconds {
        Some(d) if d > MAX_CHAINED_DURATION_SECONDS => {
            tracing::debug!(
                configured = d,
                capped = MAX_CHAINED_DURATION_SECONDS,
                "capping session duration for chained AssumeRole"
            );
            Some(MAX_CHAINED_DURATION_SECONDS)
        }
        d => d,
    }
}

fn check_session_name(session_name: &str) -> crate::Result<()> {
    if session_name.is_empty() {
        return Err(crate::Error::UserError(
            "role session name must not be empty".to_owned(),
        ));
    }
    Ok(())
}

fn credentials_from_output(
    creds: Option<&aws_sdk_sts::types::Credentials>,
    context: &str,
    role_arn: &str,
) -> crate::Result<crate::credentials::Credentials> {
    let makeerr = |what: &str| {
        crate::Error::RemoteError(crate::client::Error::Unknown(
            format!("STS {context} for '{role_arn}' returned {what}"),
            Box::new(crate::client::EmptyResult(what.to_owned())),
        ))
    };
    let creds = creds.ok_or_else(|| makeerr("empty credentials"))?;
    crate::credentials::Credentials::from_sts(creds)
        .ok_or_else(|| makeerr("an unrepresentable expiration"))
}

/// Maps STS SDK errors to crate::Error, naming the role the exchange targeted.
fn sdk_error_to_crate_error<E, R>(
    context: &str,
    role_arn: &str,
    err: aws_sdk_sts::error::SdkError<E, R>,
) -> crate::Error
where
    E: std::marker::Send
        + std::marker::Sync
        + std::error::Error
        + aws_sdk_sts::error::ProvideErrorMetadata
        + 'static,
    R: std::marker::Send + std::marker::Sync + std::fmt::Debug + 'static,
{
    use aws_sdk_sts::error::ProvideErrorMetadata;

    macro_rules! match_map_error {
        (
            $e:expr,
            $(
                $c:literal => $t:ident,
            )*
        ) => {
            match $e {
                $(
                    e1 if e1.code() == Some($c) => {
                        let message = format!(
                            "AWS STS says {code} for {context} '{role_arn}': {message:?}",
                            code = $c,
                            context = context,
                            role_arn = role_arn,
                            message = e1.message(),
                        );
                        crate::Error::RemoteError(crate::client::Error::$t(
                            message,
                            Box::new(e1),
                        ))
                    }
                )*
                e => {
                    let message = format!(
                        "AWS STS returned error for {context} '{role_arn}': {code:?} {message:?}",
                        context = context,
                        role_arn = role_arn,
                        code = e.code(),
                        message = e.message(),
                    );
                    crate::Error::RemoteError(crate::client::Error::Unknown(
                        message,
                        Box::new(e),
                    ))
                }
            }
        }
    }

    match_map_error! {
        err,
        "AccessDenied" => PermissionDenied,
        "ExpiredTokenException" => Unauthenticated,
        "ExpiredToken" => Unauthenticated,
        "InvalidClientTokenId" => Unauthenticated,
        "InvalidIdentityToken" => Unauthenticated,
        "IDPRejectedClaim" => PermissionDenied,
        "IDPCommunicationError" => ResourceExhausted,
        "NoSuchEntity" => NotFound,
        "MalformedPolicyDocument" => InvalidArgument,
        "PackedPolicyTooLarge" => InvalidArgument,
        "RegionDisabledException" => InvalidArgument,
        "ValidationError" => InvalidArgument,
        "Throttling" => ResourceExhausted,
    }
}
