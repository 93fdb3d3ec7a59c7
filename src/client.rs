//! Trust exchange capabilities and the shared HTTP client.

/// One remote trust exchange endpoint, already bound to the credentials (if any) it presents.
#[allow(async_fn_in_trait)]
pub trait TrustExchanger {
    /// Trade the bound credentials for credentials of `role_arn`.
    async fn assume_role(
        &self,
        role_arn: &str,
        session_name: &str,
    ) -> crate::Result<crate::credentials::Credentials>;

    /// Trade a bootstrap identity token for credentials of `role_arn`.
    async fn assume_role_with_web_identity(
        &self,
        token: &crate::token::BootstrapToken,
        role_arn: &str,
        session_name: &str,
    ) -> crate::Result<crate::credentials::Credentials>;
}

/// Builds a [`TrustExchanger`] per exchange, so every chain step gets a client bound to the
/// credentials produced by the step before it.
#[allow(async_fn_in_trait)]
pub trait ExchangerFactory {
    type Exchanger: TrustExchanger;

    /// Exchanger presenting no credentials; used for the web identity exchange.
    async fn anonymous(&self, proxy_url: Option<&url::Url>) -> crate::Result<Self::Exchanger>;

    async fn from_credentials(
        &self,
        credentials: &crate::credentials::Credentials,
        proxy_url: Option<&url::Url>,
    ) -> crate::Result<Self::Exchanger>;
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid Argument: {0}")]
    InvalidArgument(String, #[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String, #[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Permission denied: {0}")]
    PermissionDenied(String, #[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String, #[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Not found: {0}")]
    NotFound(String, #[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Unknown: {0} ({1})")]
    Unknown(String, #[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Placeholder source for remote errors that carry no underlying error value.
#[derive(thiserror::Error, Debug)]
#[error("{0}")]
pub struct EmptyResult(pub String);

/// HTTP client used for every outbound request, optionally routed through a forward proxy.
pub(crate) fn http(proxy_url: Option<&url::Url>) -> crate::Result<reqwest::Client> {
    let mut builder = reqwest::ClientBuilder::new()
        .user_agent(format!(
            "{}/{}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        ))
        .redirect(reqwest::redirect::Policy::none())
        .connect_timeout(std::time::Duration::from_secs(10))
        .timeout(std::time::Duration::from_secs(60));
    if let Some(proxy) = proxy_url {
        tracing::debug!(proxy_url = %proxy, "using forward proxy");
        builder = builder.proxy(reqwest::Proxy::all(proxy.as_str())?);
    }
    Ok(builder.build()?)
}
