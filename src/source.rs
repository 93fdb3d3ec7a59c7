//! Where a chain starts: the seed credentials and the ordered roles to walk through.

/// How the role sequence is obtained. Exactly one mode per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleSource {
    /// Ask the role directory for the sequence leading to `target`.
    Remote { target: String },
    /// Read role ARNs from a local file, one per line, skipping the directory.
    Static { path: std::path::PathBuf },
}

impl RoleSource {
    /// A static file wins over a target; having neither is an input error.
    pub fn from_args(
        target: Option<&str>,
        path: Option<&std::path::Path>,
    ) -> crate::Result<Self> {
        match (target, path) {
            (_, Some(p)) => Ok(RoleSource::Static { path: p.to_owned() }),
            (Some(t), None) => Ok(RoleSource::Remote {
                target: t.to_owned(),
            }),
            (None, None) => Err(crate::Error::UserError(
                "must provide either a target identifier as an argument, or --debug-file".to_owned(),
            )),
        }
    }
}

/// Maps a user-supplied target (identifier, name, ...) to the identifier the directory knows.
#[allow(async_fn_in_trait)]
pub trait TargetResolver {
    async fn resolve_target(&self, query: &str) -> crate::Result<String>;
}

/// Uses the query itself as the target identifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerbatimTarget;

impl TargetResolver for VerbatimTarget {
    async fn resolve_target(&self, query: &str) -> crate::Result<String> {
        let target = query.trim();
        if target.is_empty() {
            return Err(crate::Error::UserError(
                "target identifier must not be empty".to_owned(),
            ));
        }
        Ok(target.to_owned())
    }
}

/// Parses a static sequence file: one role ARN per line. Lines are trimmed; blank lines and
/// lines starting with `#` are skipped.
pub fn parse_static_sequence(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_owned)
        .collect()
}

pub async fn read_static_sequence(path: &std::path::Path) -> crate::Result<Vec<String>> {
    let data = tokio::fs::read(path).await.map_err(|e| {
        crate::Error::UserError(format!("failed to read file {}: {e}", path.display()))
    })?;
    let text = String::from_utf8(data).map_err(|_| {
        crate::Error::ParseError(format!("{} is not valid UTF-8", path.display()))
    })?;
    Ok(parse_static_sequence(&text))
}

/// Produces the role sequence for `source`. `make_lookup` is only called in remote mode.
#[tracing::instrument(skip(resolver, make_lookup))]
pub async fn resolve_sequence<R, L, M>(
    source: &RoleSource,
    resolver: &R,
    make_lookup: M,
) -> crate::Result<Vec<String>>
where
    R: TargetResolver,
    L: crate::directory_client::SequenceLookup,
    M: FnOnce() -> crate::Result<L>,
{
    let sequence = match source {
        RoleSource::Remote { target } => {
            let target = resolver.resolve_target(target).await?;
            make_lookup()?.assume_role_sequence(&target).await?
        }
        RoleSource::Static { path } => read_static_sequence(path).await?,
    };
    tracing::debug!(sequence = ?sequence, "resolved role sequence");
    Ok(sequence)
}

/// Exchanges the bootstrap token for credentials of the trust-anchor role.
#[tracing::instrument(skip(factory, token))]
pub async fn seed_credentials<F>(
    factory: &F,
    token: &crate::token::BootstrapToken,
    initial_role_arn: &str,
    session_name: &str,
    proxy_url: Option<&url::Url>,
) -> crate::Result<crate::credentials::Credentials>
where
    F: crate::client::ExchangerFactory,
{
    use crate::client::TrustExchanger;

    let exchanger = factory.anonymous(proxy_url).await?;
    let seed = exchanger
        .assume_role_with_web_identity(token, initial_role_arn, session_name)
        .await?;
    tracing::info!(
        role_arn = initial_role_arn,
        access_key_id = seed.access_key_id,
        expiration = %seed.expiration,
        "obtained seed credentials"
    );
    Ok(seed)
}
