//! ACL engine command line
//!
//! Decodes encoded ACLs and evaluates access against them.

use acl_engine::{
    access::{
        Access, Acl, CurrentAccess, DecisionRule, Directory, EncodedAcl, PrivilegeKind,
        PrivilegeSet, Verdict, init_defaults, privilege,
    },
    config::{AppConfig, LogFormat, load_config},
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// ACL engine - decode ACLs and evaluate access
#[derive(Parser, Debug)]
#[command(name = "acl-engine")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "ACL_ENGINE_CONFIG")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, env = "ACL_ENGINE_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode an ACL and print its entries
    Decode {
        /// Encoded ACL
        acl: String,
    },

    /// Evaluate access against an ACL
    Check {
        /// Encoded ACL
        #[arg(long)]
        acl: String,

        /// Requesting account; omit for an unauthenticated requester
        #[arg(long)]
        who: Option<String>,

        /// Owning account of the entity
        #[arg(long)]
        owner: String,

        /// Desired privilege (repeatable); none means any access
        #[arg(long = "priv", value_parser = parse_privilege)]
        privileges: Vec<PrivilegeKind>,

        /// Privilege ceiling (repeatable)
        #[arg(long, value_parser = parse_privilege)]
        filter: Vec<PrivilegeKind>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the default ACL encodings
    Defaults,
}

fn parse_privilege(s: &str) -> Result<PrivilegeKind, String> {
    PrivilegeKind::try_parse(s).ok_or_else(|| {
        let known: Vec<&str> = PrivilegeKind::all().iter().map(|k| k.as_str()).collect();
        format!("unknown privilege '{}', expected one of: {}", s, known.join(", "))
    })
}

/// JSON form of an evaluation
#[derive(Debug, Serialize)]
struct CheckReport {
    allowed: bool,
    rule: DecisionRule,
    entry: Option<String>,
    privileges: Vec<PrivilegeReport>,
}

#[derive(Debug, Serialize)]
struct PrivilegeReport {
    privilege: PrivilegeKind,
    verdict: Verdict,
}

impl From<&CurrentAccess> for CheckReport {
    fn from(ca: &CurrentAccess) -> Self {
        Self {
            allowed: ca.access_allowed(),
            rule: ca.rule(),
            entry: ca.ace().map(ToString::to_string),
            privileges: ca
                .privileges()
                .iter()
                .map(|(privilege, verdict)| PrivilegeReport { privilege, verdict })
                .collect(),
        }
    }
}

fn init_logging(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

fn run_decode(config: &AppConfig, encoded: &str) -> anyhow::Result<()> {
    let mut acl = Acl::new(config.engine.debug);
    acl.decode(&mut EncodedAcl::from(encoded))
        .inspect_err(|e| error!(error = %e, "Failed to decode ACL"))?;

    for ace in acl.aces() {
        println!("{}", ace);
    }
    Ok(())
}

fn run_check(
    config: &AppConfig,
    acl: &str,
    who: Option<&str>,
    owner: &str,
    privileges: &[PrivilegeKind],
    filter: &[PrivilegeKind],
    json: bool,
) -> anyhow::Result<()> {
    let directory = Directory::new(&config.directory);
    let requester = directory.principal(who);
    let owner = directory.principal(Some(owner));

    let how: Vec<_> = privileges.iter().map(|k| privilege::privilege(*k)).collect();
    let filter = (!filter.is_empty()).then(|| PrivilegeSet::from_kinds(filter));

    let ca = Access::new(config.engine.debug)
        .evaluate_access(&requester, &owner, &how, acl, filter.as_ref())
        .inspect_err(|e| error!(error = %e, "Failed to evaluate access"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&CheckReport::from(&ca))?);
        return Ok(());
    }

    println!("{}", if ca.access_allowed() { "allowed" } else { "denied" });
    println!("rule: {}", ca.rule());
    if let Some(ace) = ca.ace() {
        println!("entry: {}", ace);
    }
    let granted: Vec<&str> = ca
        .privileges()
        .iter()
        .filter(|(_, verdict)| verdict.is_allowed())
        .map(|(kind, _)| kind.as_str())
        .collect();
    println!("granted: {}", granted.join(", "));
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Pick up ACL_ENGINE_* from a local .env if present
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration before logging so the format can be honored
    let loaded = load_config(args.config.as_deref());

    let (level, format) = match &loaded {
        Ok(config) => (config.logging.level.clone(), config.logging.format),
        Err(_) => ("info".to_string(), LogFormat::Pretty),
    };
    init_logging(args.log_level.as_deref().unwrap_or(&level), format);

    let config = loaded.inspect_err(|e| error!(error = %e, "Failed to load configuration"))?;

    init_defaults().inspect_err(|e| error!(error = %e, "Failed to build default ACLs"))?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting ACL engine");

    match args.command {
        Command::Decode { acl } => run_decode(&config, &acl),
        Command::Check {
            acl,
            who,
            owner,
            privileges,
            filter,
            json,
        } => run_check(
            &config,
            &acl,
            who.as_deref(),
            &owner,
            &privileges,
            &filter,
            json,
        ),
        Command::Defaults => {
            let defaults = init_defaults()?;
            println!("public:   {}", defaults.public);
            println!("personal: {}", defaults.personal);
            Ok(())
        }
    }
}
