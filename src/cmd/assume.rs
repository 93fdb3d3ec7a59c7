use anyhow::Context;

#[derive(clap::Args, Debug, Default)]
#[command(long_about = indoc::indoc! {"
    Performs the assume-role chaining necessary to obtain temporary access to a target AWS account.

    First the bootstrap identity token is exchanged for credentials of the configured trust-anchor
    role (`assume_initial_arn`), equivalent to `aws sts assume-role-with-web-identity` with the
    `email` claim of the token as the role session name.

    Then the ordered list of jump roles for the target is fetched from the role directory (or read
    from --debug-file), and each role is assumed in turn with the credentials of the previous one,
    equivalent to repeated `aws sts assume-role` calls.

    By default the final credentials are printed as shell exports. With --console a federated
    AWS Management Console sign-in URL is printed instead.
"})]
pub struct AssumeArgs {
    /// Target identifier to look up the role sequence for.
    pub target: Option<String>,

    /// Output format of the credentials: env, json or yaml.
    #[arg(short = 'o', long, default_value = "env")]
    pub output: String,

    /// File listing the role ARNs to assume in order (one per line, excluding the trust-anchor
    /// role). Bypasses the role directory.
    #[arg(long)]
    pub debug_file: Option<std::path::PathBuf>,

    /// Print a console sign-in URL instead of credentials.
    #[arg(long, default_value_t = false)]
    pub console: bool,
}

impl AssumeArgs {
    pub fn output_mode(&self) -> crate::Result<crate::output::OutputMode> {
        if self.console {
            return Ok(crate::output::OutputMode::Console);
        }
        Ok(crate::output::OutputMode::Credentials(self.output.parse()?))
    }

    pub fn role_source(&self) -> crate::Result<crate::source::RoleSource> {
        crate::source::RoleSource::from_args(self.target.as_deref(), self.debug_file.as_deref())
    }
}

#[tokio::main]
pub async fn run(args: &AssumeArgs) -> Result<(), anyhow::Error> {
    let config = crate::config::Config::load().await?;
    tracing::debug!(config = ?config, "loaded configuration");

    let token_source = crate::token::CommandTokenSource::from_env(config.token_command.clone());
    let factory = crate::sts_assume_role::StsExchangerFactory::from_config(&config);

    // Once ctrl_c() is registered SIGINT no longer terminates the process; every stage of
    // `assume` honours the flag instead.
    let (cancel_tx, cancel_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted; aborting");
            cancel_tx.send(true).ok();
        }
    });
    let interrupted = cancel_rx.clone();

    let result = assume(
        args,
        &config,
        &token_source,
        &factory,
        &crate::source::VerbatimTarget,
        cancel_rx,
    )
    .await;

    let result = match result {
        Ok(_) if *interrupted.borrow() => Err(crate::Error::Cancelled {
            completed_steps: 0,
        }
        .into()),
        r => r,
    };

    match result {
        Ok(text) => {
            println!("{text}");
            Ok(())
        }
        Err(e) => match e.downcast_ref::<crate::Error>() {
            Some(crate::Error::Cancelled { .. }) => {
                let product = env!("CARGO_PKG_NAME");
                eprintln!(":: {product} :: {e}");
                Err(crate::Error::SilentlyExitWithCode(std::process::ExitCode::from(130)).into())
            }
            _ => Err(e),
        },
    }
}

/// Runs the whole assume flow and returns the text to print.
pub async fn assume<T, F, R>(
    args: &AssumeArgs,
    config: &crate::config::Config,
    token_source: &T,
    factory: &F,
    resolver: &R,
    mut cancel: tokio::sync::watch::Receiver<bool>,
) -> Result<String, anyhow::Error>
where
    T: crate::token::TokenSource,
    F: crate::client::ExchangerFactory,
    R: crate::source::TargetResolver,
{
    // Everything checkable offline is checked before the first network call
    let mode = args.output_mode()?;
    let source = args.role_source()?;
    config.validate()?;
    let initial_role_arn = config.try_assume_initial_arn()?;
    if matches!(source, crate::source::RoleSource::Remote { .. }) {
        config.try_url()?;
    }
    let proxy_url = config.proxy_url.as_ref();

    let token = unless_cancelled(&mut cancel, 0, async {
        token_source
            .bootstrap_token()
            .await
            .context("failed to retrieve bootstrap token")
    })
    .await?;
    let session_name = token
        .email()
        .context("unable to extract email from the bootstrap token")?;

    let seed = unless_cancelled(&mut cancel, 0, async {
        crate::source::seed_credentials(factory, &token, initial_role_arn, &session_name, proxy_url)
            .await
            .context("failed to assume the trust-anchor role using the bootstrap token")
    })
    .await?;

    let sequence = unless_cancelled(&mut cancel, 0, async {
        crate::source::resolve_sequence(&source, resolver, || {
            crate::directory_client::Client::new(config.try_url()?.clone(), &token, proxy_url)
        })
        .await
        .context("failed to obtain the assume-role sequence")
    })
    .await?;

    let total = sequence.len();
    let credentials = crate::chain::assume_sequence_until(
        crate::chain::ChainRequest {
            session_name,
            sequence,
            proxy_url: proxy_url.cloned(),
            seed,
        },
        factory,
        cancel.clone(),
    )
    .await
    .context("failed to assume role sequence")?;

    unless_cancelled(&mut cancel, total, present(mode, &credentials, config)).await
}

/// Runs `stage` unless `cancel` is set before or while it runs.
async fn unless_cancelled<T>(
    cancel: &mut tokio::sync::watch::Receiver<bool>,
    completed_steps: usize,
    stage: impl std::future::Future<Output = Result<T, anyhow::Error>>,
) -> Result<T, anyhow::Error> {
    if *cancel.borrow() {
        return Err(crate::Error::Cancelled { completed_steps }.into());
    }
    let cancelled = async {
        // A dropped sender can no longer cancel
        if cancel.wait_for(|c| *c).await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    tokio::select! {
        biased;
        _ = cancelled => Err(crate::Error::Cancelled { completed_steps }.into()),
        r = stage => r,
    }
}

#[tracing::instrument(skip(credentials, config))]
async fn present(
    mode: crate::output::OutputMode,
    credentials: &crate::credentials::Credentials,
    config: &crate::config::Config,
) -> Result<String, anyhow::Error> {
    match mode {
        crate::output::OutputMode::Console => {
            let endpoints = crate::console::Endpoints::from_config(config)?;
            let signin_token =
                crate::console::get_signin_token(&endpoints, credentials, config.proxy_url.as_ref())
                    .await
                    .context("failed to get signin token from AWS")?;
            let url = crate::console::console_url(&endpoints, &signin_token);
            Ok(format!("The AWS Console URL is:\n{url}"))
        }
        crate::output::OutputMode::Credentials(format) => {
            crate::output::CredentialsResponse::new(credentials, config.region())
                .render(format)
                .context("failed to format output correctly")
        }
    }
}
