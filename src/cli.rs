use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

use pushkit::config::{AppConfig, FileConfig};

const DEFAULT_SUBJECT: &str = "mailto:you@example.com";

pub(crate) enum RunOutcome {
    Serve(AppConfig),
    Exit(i32),
}

pub(crate) fn run() -> RunOutcome {
    let cli = Cli::parse();
    if let Some(Command::Init(args)) = cli.command {
        let code = run_init(args);
        return RunOutcome::Exit(code);
    }

    let file = match cli.config.as_ref() {
        Some(path) => match FileConfig::load(path) {
            Ok(file) => file,
            Err(err) => {
                eprintln!("error: {err}");
                return RunOutcome::Exit(2);
            }
        },
        None => FileConfig::default(),
    };

    match resolve_config(&cli, file) {
        Ok(config) => RunOutcome::Serve(config),
        Err(err) => {
            eprintln!("error: {err}");
            RunOutcome::Exit(2)
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "pushkit", version, about = "Web Push subscription and notification server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    #[arg(long, env = "PUSHKIT_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, env = "PUSHKIT_BIND")]
    bind: Option<SocketAddr>,
    #[arg(long, env = "PUSHKIT_API_PREFIX")]
    api_prefix: Option<String>,
    #[arg(long, env = "PUSHKIT_VAPID_PRIVATE_KEY")]
    vapid_private_key: Option<String>,
    #[arg(long, env = "PUSHKIT_VAPID_PUBLIC_KEY")]
    vapid_public_key: Option<String>,
    #[arg(long, env = "PUSHKIT_VAPID_SUBJECT")]
    vapid_subject: Option<String>,
    #[arg(long, env = "PUSHKIT_FANOUT_CONCURRENCY")]
    fanout_concurrency: Option<usize>,
    #[arg(long, env = "PUSHKIT_LOG_LEVEL")]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a VAPID key pair.
    Init(InitArgs),
}

#[derive(Args, Debug)]
struct InitArgs {
    #[arg(long)]
    subject: Option<String>,
}

fn run_init(args: InitArgs) -> i32 {
    let credentials = match pushkit::generate_vapid_credentials() {
        Ok(credentials) => credentials,
        Err(err) => {
            eprintln!("failed to generate VAPID credentials: {err}");
            return 1;
        }
    };
    let (subject, show_subject_note) = match args.subject {
        Some(subject) => (subject, false),
        None => (DEFAULT_SUBJECT.to_string(), true),
    };

    println!("VAPID credentials generated.");
    println!();
    println!("PUSHKIT_VAPID_PRIVATE_KEY=\"{}\"", credentials.private_key);
    println!("PUSHKIT_VAPID_PUBLIC_KEY=\"{}\"", credentials.public_key);
    println!("PUSHKIT_VAPID_SUBJECT=\"{subject}\"");
    if show_subject_note {
        println!();
        println!("Note: replace PUSHKIT_VAPID_SUBJECT with a contact URI you control.");
    }
    println!();
    println!("[vapid]");
    println!("private_key = \"{}\"", credentials.private_key);
    println!("public_key = \"{}\"", credentials.public_key);
    println!("subject = \"{subject}\"");
    0
}

fn resolve_config(cli: &Cli, file: FileConfig) -> Result<AppConfig, String> {
    let defaults = AppConfig::default();

    let fanout_concurrency = cli
        .fanout_concurrency
        .or(file.fanout_concurrency)
        .unwrap_or(defaults.fanout_concurrency);
    if fanout_concurrency == 0 {
        return Err("fanout concurrency must be greater than 0".to_string());
    }

    let log_level = cli
        .log_level
        .clone()
        .or(file.log_level)
        .unwrap_or(defaults.log_level);
    if log_level.trim().is_empty() {
        return Err("log level cannot be empty".to_string());
    }

    Ok(AppConfig {
        bind: cli.bind.or(file.bind).unwrap_or(defaults.bind),
        api_prefix: cli
            .api_prefix
            .clone()
            .or(file.api_prefix)
            .unwrap_or(defaults.api_prefix),
        vapid_private_key: cli.vapid_private_key.clone().or(file.vapid.private_key),
        vapid_public_key: cli.vapid_public_key.clone().or(file.vapid.public_key),
        vapid_subject: cli.vapid_subject.clone().or(file.vapid.subject),
        fanout_concurrency,
        log_level,
    })
}
