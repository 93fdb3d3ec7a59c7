#[derive(clap::Parser)]
#[clap(author, version, long_about = None)]
#[clap(about = "Obtain AWS credentials by assuming a chain of roles")]
#[clap(propagate_version = true)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Assume the role sequence leading to a target and print credentials or a console URL
    Assume(rolechain::cmd::assume::AssumeArgs),
}

fn main() -> Result<std::process::ExitCode, anyhow::Error> {
    use clap::Parser;
    let cli = Cli::parse();

    enable_tracing();
    let retval = match &cli.command {
        Commands::Assume(args) => rolechain::cmd::assume::run(args),
    };
    match retval {
        Ok(_) => Ok(std::process::ExitCode::SUCCESS),
        Err(e) => match e.downcast_ref::<rolechain::Error>() {
            Some(rolechain::Error::SilentlyExitWithCode(c)) => Ok(*c),
            _ => Err(e),
        },
    }
}

// stdout carries credentials only; logs go to stderr
fn enable_tracing() {
    let filter = std::env::var("ROLECHAIN_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "rolechain=warn".to_owned());

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();
}
