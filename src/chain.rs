//! Sequential role assumption: each link presents the credentials issued by the link before it.

/// Everything a chain run needs besides the exchanger factory.
#[derive(Debug, Clone)]
pub struct ChainRequest {
    /// Recorded by the remote side on every exchange (audit trail).
    pub session_name: String,
    pub sequence: Vec<String>,
    pub proxy_url: Option<url::Url>,
    pub seed: crate::credentials::Credentials,
}

/// Assumes every role in `request.sequence` in order and returns the last credentials.
///
/// An empty sequence returns the seed unchanged. The first failing link aborts the chain;
/// the error carries its 1-based position and role ARN.
pub async fn assume_sequence<F>(
    request: ChainRequest,
    factory: &F,
) -> crate::Result<crate::credentials::Credentials>
where
    F: crate::client::ExchangerFactory,
{
    let (_tx, rx) = tokio::sync::watch::channel(false);
    assume_sequence_until(request, factory, rx).await
}

/// Like [`assume_sequence`], but stops before starting the next link once `cancel` turns true.
/// An exchange already in flight is always allowed to finish.
pub async fn assume_sequence_until<F>(
    request: ChainRequest,
    factory: &F,
    cancel: tokio::sync::watch::Receiver<bool>,
) -> crate::Result<crate::credentials::Credentials>
where
    F: crate::client::ExchangerFactory,
{
    use crate::client::TrustExchanger;

    let total = request.sequence.len();
    let mut current = request.seed;

    for (i, role_arn) in request.sequence.iter().enumerate() {
        let step = i + 1;
        if *cancel.borrow() {
            tracing::warn!(step = step, total = total, "chain cancelled");
            return Err(crate::Error::Cancelled { completed_steps: i });
        }

        tracing::debug!(
            step = step,
            total = total,
            role_arn = role_arn,
            session_name = request.session_name,
            "assuming role"
        );
        let wrap = |e: crate::Error| crate::Error::ChainStep {
            step,
            total,
            role_arn: role_arn.clone(),
            source: Box::new(e),
        };
        let exchanger = factory
            .from_credentials(&current, request.proxy_url.as_ref())
            .await
            .map_err(wrap)?;
        current = exchanger
            .assume_role(role_arn, &request.session_name)
            .await
            .map_err(wrap)?;
        tracing::info!(
            step = step,
            total = total,
            role_arn = role_arn,
            access_key_id = current.access_key_id,
            expiration = %current.expiration,
            "assumed role"
        );
    }

    Ok(current)
}
