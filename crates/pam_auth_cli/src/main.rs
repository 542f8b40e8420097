mod prompt;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{ArgAction, Parser};
use pam_auth::{Authenticator, Config, PamLibrary};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Check a password against the system's PAM stack and print true or false.
#[derive(Parser, Debug)]
#[command(name = "pam-auth", version, about)]
struct Args {
    /// User to authenticate [default: the current user]
    #[arg(short, long, env = "USER")]
    user: Option<String>,

    /// PAM service to authenticate against [default: from config, else "login"]
    #[arg(short, long)]
    service: Option<String>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Read the password from the first line of stdin instead of prompting
    #[arg(long)]
    password_stdin: bool,

    /// Log more (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(true) => {
            println!("true");
            ExitCode::SUCCESS
        }
        Ok(false) => {
            println!("false");
            ExitCode::from(1)
        }
        Err(err) => {
            eprintln!("pam-auth: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> anyhow::Result<bool> {
    let config = match &args.config {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };
    let service = args.service.clone().unwrap_or_else(|| config.service.clone());
    let user = match &args.user {
        Some(user) => user.clone(),
        None => prompt::current_user().context("could not determine the current user")?,
    };

    // Resolve PAM before prompting so a broken setup fails fast.
    let library = PamLibrary::load(&config.library).context("loading PAM")?;
    debug!(?library, %service, %user, "ready to authenticate");

    let password = if args.password_stdin {
        prompt::read_password_stdin()
    } else {
        prompt::read_password("Password: ")
    }
    .context("reading password")?;

    let auth = Authenticator::new(library.functions(), service).with_policy(config.conversation_policy);
    Ok(auth.authenticate(&user, &password))
}
