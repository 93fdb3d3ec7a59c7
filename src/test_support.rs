//! Helpers shared by tests: local HTTP stubs and a scripted exchanger.

/// Serves `router` on an ephemeral loopback port and returns its base URL.
pub(crate) async fn serve(router: axum::Router) -> url::Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    url::Url::parse(&format!("http://{addr}/")).unwrap()
}

/// Stands in for a forward proxy: answers every request with `body` and records the
/// absolute-form request targets it was asked to forward.
pub(crate) async fn serve_proxy(
    content_type: &'static str,
    body: String,
) -> (url::Url, std::sync::Arc<std::sync::Mutex<Vec<String>>>) {
    let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let router = axum::Router::new().fallback({
        let seen = seen.clone();
        move |uri: axum::http::Uri| {
            let seen = seen.clone();
            let body = body.clone();
            async move {
                seen.lock().unwrap().push(uri.to_string());
                ([(axum::http::header::CONTENT_TYPE, content_type)], body)
            }
        }
    });
    (serve(router).await, seen)
}

/// Successful STS response body for `action` (`AssumeRole`, `AssumeRoleWithWebIdentity`).
pub(crate) fn sts_credentials_xml(action: &str, access_key_id: &str) -> String {
    format!(
        r#"<{action}Response xmlns="https://sts.amazonaws.com/doc/2011-06-15/">
  <{action}Result>
    <AssumedRoleUser>
      <AssumedRoleId>AROAEXAMPLE:someone@example.com</AssumedRoleId>
      <Arn>arn:aws:sts::123456789012:assumed-role/Next/someone@example.com</Arn>
    </AssumedRoleUser>
    <Credentials>
      <AccessKeyId>{access_key_id}</AccessKeyId>
      <SecretAccessKey>secret-of-{access_key_id}</SecretAccessKey>
      <SessionToken>token-of-{access_key_id}</SessionToken>
      <Expiration>2030-01-02T03:04:05Z</Expiration>
    </Credentials>
  </{action}Result>
  <ResponseMetadata><RequestId>c6104cbe-af31-11e0-8154-cbc7ccf896c7</RequestId></ResponseMetadata>
</{action}Response>"#
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Anonymous {
        proxy_url: Option<url::Url>,
    },
    WebIdentity {
        role_arn: String,
    },
    AssumeRole {
        presented: String,
        role_arn: String,
        session_name: String,
        proxy_url: Option<url::Url>,
    },
}

/// Exchanger whose issued access key id records the path taken: `{presented}>{role}`.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeFactory {
    pub calls: std::sync::Arc<std::sync::Mutex<Vec<Call>>>,
    pub fail_on: Option<String>,
}

impl FakeFactory {
    pub fn failing_on(role_arn: &str) -> Self {
        Self {
            fail_on: Some(role_arn.to_owned()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn assume_role_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::AssumeRole { .. }))
            .collect()
    }
}

pub(crate) struct FakeExchanger {
    presented: Option<String>,
    proxy_url: Option<url::Url>,
    factory: FakeFactory,
}

pub(crate) fn issued(access_key_id: String) -> crate::credentials::Credentials {
    crate::credentials::Credentials::new(
        access_key_id.clone(),
        format!("secret-of-{access_key_id}"),
        format!("token-of-{access_key_id}"),
        chrono::DateTime::from_timestamp(1_900_000_000, 0).unwrap(),
    )
}

impl crate::client::ExchangerFactory for FakeFactory {
    type Exchanger = FakeExchanger;

    async fn anonymous(&self, proxy_url: Option<&url::Url>) -> crate::Result<FakeExchanger> {
        self.calls.lock().unwrap().push(Call::Anonymous {
            proxy_url: proxy_url.cloned(),
        });
        Ok(FakeExchanger {
            presented: None,
            proxy_url: proxy_url.cloned(),
            factory: self.clone(),
        })
    }

    async fn from_credentials(
        &self,
        credentials: &crate::credentials::Credentials,
        proxy_url: Option<&url::Url>,
    ) -> crate::Result<FakeExchanger> {
        Ok(FakeExchanger {
            presented: Some(credentials.access_key_id.clone()),
            proxy_url: proxy_url.cloned(),
            factory: self.clone(),
        })
    }
}

impl crate::client::TrustExchanger for FakeExchanger {
    async fn assume_role(
        &self,
        role_arn: &str,
        session_name: &str,
    ) -> crate::Result<crate::credentials::Credentials> {
        let presented = self.presented.clone().unwrap_or_default();
        self.factory.calls.lock().unwrap().push(Call::AssumeRole {
            presented: presented.clone(),
            role_arn: role_arn.to_owned(),
            session_name: session_name.to_owned(),
            proxy_url: self.proxy_url.clone(),
        });
        if self.factory.fail_on.as_deref() == Some(role_arn) {
            return Err(crate::Error::RemoteError(
                crate::client::Error::PermissionDenied(
                    format!("AWS STS says AccessDenied for AssumeRole '{role_arn}'"),
                    Box::new(crate::client::EmptyResult("denied".to_owned())),
                ),
            ));
        }
        Ok(issued(format!("{presented}>{role_arn}")))
    }

    async fn assume_role_with_web_identity(
        &self,
        _token: &crate::token::BootstrapToken,
        role_arn: &str,
        _session_name: &str,
    ) -> crate::Result<crate::credentials::Credentials> {
        self.factory.calls.lock().unwrap().push(Call::WebIdentity {
            role_arn: role_arn.to_owned(),
        });
        if self.factory.fail_on.as_deref() == Some(role_arn) {
            return Err(crate::Error::RemoteError(
                crate::client::Error::Unauthenticated(
                    format!("AWS STS says InvalidIdentityToken for '{role_arn}'"),
                    Box::new(crate::client::EmptyResult("rejected".to_owned())),
                ),
            ));
        }
        Ok(issued(format!("seed@{role_arn}")))
    }
}
