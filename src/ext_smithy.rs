//! Lets the AWS SDK send its requests through our reqwest client (and therefore its proxy).

use aws_smithy_runtime_api::client::http::{
    HttpClient, HttpConnector, HttpConnectorFuture, HttpConnectorSettings, SharedHttpConnector,
};
use aws_smithy_runtime_api::client::orchestrator::{HttpRequest, HttpResponse};
use aws_smithy_runtime_api::client::result::ConnectorError;
use aws_smithy_runtime_api::client::runtime_components::RuntimeComponents;

#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    inner: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new(inner: reqwest::Client) -> Self {
        Self { inner }
    }
}

impl HttpConnector for ReqwestHttpClient {
    fn call(&self, request: HttpRequest) -> HttpConnectorFuture {
        let client = self.inner.clone();
        HttpConnectorFuture::new(async move { send(client, request).await })
    }
}

impl HttpClient for ReqwestHttpClient {
    fn http_connector(
        &self,
        _settings: &HttpConnectorSettings,
        _components: &RuntimeComponents,
    ) -> SharedHttpConnector {
        SharedHttpConnector::new(self.clone())
    }
}

async fn send(
    client: reqwest::Client,
    request: HttpRequest,
) -> Result<HttpResponse, ConnectorError> {
    let method = reqwest::Method::from_bytes(request.method().as_bytes())
        .map_err(|e| ConnectorError::other(Box::new(e), None))?;
    let mut req = client.request(method, request.uri());
    for (name, value) in request.headers().iter() {
        req = req.header(name, value);
    }
    let body = request
        .body()
        .bytes()
        .map(|b| b.to_vec())
        .unwrap_or_default();

    let resp = req.body(body).send().await.map_err(connector_error)?;

    let status = aws_smithy_runtime_api::http::StatusCode::try_from(resp.status().as_u16())
        .map_err(|e| ConnectorError::other(Box::new(e), None))?;
    let headers = resp.headers().clone();
    let bytes = resp.bytes().await.map_err(connector_error)?;

    let mut response = HttpResponse::new(status, aws_smithy_types::body::SdkBody::from(bytes.to_vec()));
    for (name, value) in headers.iter() {
        if let Ok(v) = value.to_str() {
            response
                .headers_mut()
                .append(name.as_str().to_owned(), v.to_owned());
        }
    }
    Ok(response)
}

fn connector_error(e: reqwest::Error) -> ConnectorError {
    if e.is_timeout() {
        ConnectorError::timeout(Box::new(e))
    } else if e.is_connect() || e.is_request() || e.is_body() {
        ConnectorError::io(Box::new(e))
    } else {
        ConnectorError::other(Box::new(e), None)
    }
}

#[cfg(test)]
mod tests {
    use crate::client::{ExchangerFactory, TrustExchanger};

    #[tokio::test]
    async fn sts_requests_go_through_proxy() {
        let (proxy, seen) = crate::test_support::serve_proxy(
            "text/xml",
            crate::test_support::sts_credentials_xml("AssumeRole", "ASIAPROXY"),
        )
        .await;

        let factory = crate::sts_assume_role::StsExchangerFactory {
            region: "us-east-1".to_owned(),
            endpoint_url: Some(url::Url::parse("http://sts.nonexistent.invalid/").unwrap()),
            duration_seconds: None,
        };
        let seed = crate::test_support::issued("ASIASEED".to_owned());
        let creds = factory
            .from_credentials(&seed, Some(&proxy))
            .await
            .unwrap()
            .assume_role("arn:aws:iam::123456789012:role/Next", "someone@example.com")
            .await
            .unwrap();

        assert_eq!(creds.access_key_id, "ASIAPROXY");
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["http://sts.nonexistent.invalid/".to_owned()]
        );
    }

    #[tokio::test]
    async fn response_headers_and_status_are_preserved() {
        let router = axum::Router::new().route(
            "/",
            axum::routing::get(|| async {
                (
                    axum::http::StatusCode::ACCEPTED,
                    [("x-amzn-requestid", "req-1")],
                    "ok",
                )
            }),
        );
        let url = crate::test_support::serve(router).await;

        let request = aws_smithy_runtime_api::client::orchestrator::HttpRequest::get(url.as_str())
            .unwrap();
        let response = super::send(reqwest::Client::new(), request).await.unwrap();
        assert_eq!(response.status().as_u16(), 202);
        assert_eq!(response.headers().get("x-amzn-requestid"), Some("req-1"));
        assert_eq!(response.body().bytes(), Some(&b"ok"[..]));
    }
}
