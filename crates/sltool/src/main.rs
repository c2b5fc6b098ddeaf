//! sltool: key generation, license and request tooling
//!
//! ```bash
//! sltool keygen -t ed25519
//! sltool keygen -t rsa -b 4096 -P secret
//! sltool license build -r request.json -e id_rsa.pem -n secret
//! sltool license parse -d id_rsa.pub.pem
//! sltool req build -e id_rsa.pub.pem
//! sltool req parse -d id_rsa.pem -n secret
//! sltool types
//! ```
//!
//! Set `RUST_LOG=debug` for library tracing on stderr.

mod config;

use clap::{Parser, Subcommand};
use config::{
    KeygenArgs, KeygenConfig, LicenseBuildArgs, LicenseBuildConfig, LicenseParseArgs,
    LicenseParseConfig, RequestBuildArgs, RequestBuildConfig, RequestParseArgs,
    RequestParseConfig,
};
use superlicense::key::{generate_key_pair, read_private_key, read_public_key, write_key_pair};
use superlicense::mark::{collect_marks, MachineId};
use superlicense::{
    ClaimRegistry, ContainerError, CreateLicenseRequest, KeyError, LicenseV1, RequestV1,
    SuperLicenseError,
};
use tracing::info;
use tracing_subscriber::prelude::__tracing_subscriber_SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "sltool")]
#[command(about = "Offline license tooling: keys, licenses and license requests")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a key pair
    Keygen(KeygenArgs),
    /// Build or parse licenses
    License {
        #[command(subcommand)]
        command: LicenseCommands,
    },
    /// Build or parse license requests
    Req {
        #[command(subcommand)]
        command: RequestCommands,
    },
    /// List registered license types and their claim rules
    Types,
}

#[derive(Subcommand)]
enum LicenseCommands {
    /// Validate a creation request and write a signed license
    Build(LicenseBuildArgs),
    /// Verify a license and print its claims
    Parse(LicenseParseArgs),
}

#[derive(Subcommand)]
enum RequestCommands {
    /// Collect machine marks and write a request
    Build(RequestBuildArgs),
    /// Print the marks in a request
    Parse(RequestParseArgs),
}

fn keygen(config: KeygenConfig) -> CliResult {
    let pair = generate_key_pair(config.algorithm, config.bits)?;
    let (private_path, public_path) = write_key_pair(
        &pair,
        config.stem.as_deref(),
        config.passphrase.as_bytes(),
        &config.comment,
    )?;

    println!("{} key pair generated", config.algorithm);
    println!("  private: {}", private_path.display());
    println!("  public:  {}", public_path.display());
    Ok(())
}

fn license_build(config: LicenseBuildConfig, registry: &ClaimRegistry) -> CliResult {
    let request: CreateLicenseRequest = serde_json::from_slice(&std::fs::read(&config.request)?)?;

    let sign_key = read_private_key(&config.sign_key, config.sign_passphrase.as_bytes())?;
    let enc_key = match &config.enc_key {
        Some((path, passphrase)) => Some(read_private_key(path, passphrase.as_bytes())?),
        None => None,
    };
    let enc_key = enc_key.as_ref().map(|k| k.as_rsa()).transpose()?;

    let bytes = LicenseV1::issue(
        registry,
        &request,
        sign_key.as_ed25519()?,
        enc_key,
        config.flags,
    )?;
    superlicense::armor::write_artifact(&config.output, &bytes)?;

    info!(license_type = %request.name, flags = %config.flags, "License issued");
    println!("build license ok: {}", config.output.display());
    Ok(())
}

fn license_parse(config: LicenseParseConfig) -> CliResult {
    let verify_key = read_public_key(&config.verify_key)?;
    let dec_key = config.dec_key.as_ref().map(read_public_key).transpose()?;
    let dec_key = dec_key.as_ref().map(|k| k.as_rsa()).transpose()?;

    let license = LicenseV1::parse_file(&config.input, verify_key.as_ed25519()?, dec_key)?;
    if config.check_sections {
        license.verify_sections_agree()?;
    }

    println!("{}", serde_json::to_string_pretty(license.claims())?);

    let now = chrono::Utc::now().timestamp();
    for claim in license.expired_claims(now) {
        eprintln!("warning: claim {} expired", claim.code);
    }
    Ok(())
}

fn request_build(config: RequestBuildConfig) -> CliResult {
    let enc_key = config.enc_key.as_ref().map(read_public_key).transpose()?;
    let enc_key = enc_key.as_ref().map(|k| k.as_rsa()).transpose()?;

    let machine_id = MachineId::from_path(&config.machine_id_path);
    let marks = collect_marks(&[&machine_id]);
    for mark in marks.iter().filter(|m| !m.is_ok()) {
        eprintln!("warning: mark {} unavailable: {}", mark.k, mark.e);
    }

    RequestV1::build_file(&config.output, &marks, enc_key, config.flags)?;
    println!("build license req ok: {}", config.output.display());
    Ok(())
}

fn request_parse(config: RequestParseConfig) -> CliResult {
    let dec_key = match &config.dec_key {
        Some((path, passphrase)) => Some(read_private_key(path, passphrase.as_bytes())?),
        None => None,
    };
    let dec_key = dec_key.as_ref().map(|k| k.as_rsa()).transpose()?;

    let request = RequestV1::parse_file(&config.input, dec_key)?;
    if config.check_sections {
        request.verify_sections_agree()?;
    }

    println!("{}", serde_json::to_string_pretty(request.marks())?);
    Ok(())
}

fn list_types(registry: &ClaimRegistry) -> CliResult {
    for name in registry.names() {
        let Some(license_type) = registry.get(name) else {
            continue;
        };
        println!("{}", name);
        for rule in license_type.rules() {
            let mut line = format!("  {:<12}", rule.code);
            if rule.required {
                line.push_str(" required");
            }
            if !rule.example.is_empty() {
                line.push_str(&format!(" example={}", rule.example));
            }
            if !rule.tip.is_empty() {
                line.push_str(&format!(" tip={}", rule.tip));
            }
            println!("{}", line);
        }
    }
    Ok(())
}

fn run(cli: Cli) -> CliResult {
    let registry = ClaimRegistry::with_builtin_types();

    match cli.command {
        Commands::Keygen(args) => keygen(KeygenConfig::try_from(args)?),
        Commands::License { command } => match command {
            LicenseCommands::Build(args) => license_build(LicenseBuildConfig::try_from(args)?, &registry),
            LicenseCommands::Parse(args) => license_parse(LicenseParseConfig::try_from(args)?),
        },
        Commands::Req { command } => match command {
            RequestCommands::Build(args) => request_build(RequestBuildConfig::try_from(args)?),
            RequestCommands::Parse(args) => request_parse(RequestParseConfig::try_from(args)?),
        },
        Commands::Types => list_types(&registry),
    }
}

fn suggestion<'a>(e: &'a (dyn std::error::Error + 'static)) -> Option<&'a str> {
    if let Some(e) = e.downcast_ref::<SuperLicenseError>() {
        return e.suggestion();
    }
    if let Some(e) = e.downcast_ref::<ContainerError>() {
        return e.suggestion();
    }
    e.downcast_ref::<KeyError>().and_then(KeyError::suggestion)
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        if let Some(hint) = suggestion(e.as_ref()) {
            eprintln!("Hint: {}", hint);
        }
        std::process::exit(1);
    }
}
