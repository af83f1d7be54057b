//! NextGCore UDM Key Tool
//!
//! Operator front end for the UDM subscriber-credential functions:
//! - Permanent key unwrap (local protecting keys or SSM)
//! - OPc derivation
//! - Milenage-256 authentication vector generation

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use nextgcore_udm_keytool::{
    AuthVectorGenerator, KeyEncoding, KeyUnwrapService, PermanentKey, UdmKeyConfig, UnwrapRequest,
};
use serde::Serialize;
use zeroize::Zeroizing;

/// NextGCore UDM Key Tool
#[derive(Parser, Debug)]
#[command(name = "nextgcore-udm-keytool")]
#[command(author = "NextGCore")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "UDM permanent key unwrap and Milenage-256 vector generation", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, default_value = "/etc/nextgcore/udm-keytool.yaml")]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'e', long, default_value = "info")]
    log_level: String,

    /// Disable color output
    #[arg(short = 'm', long)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recover a permanent key
    Unwrap(UnwrapArgs),

    /// Derive OPc from the configured OP
    Opc {
        /// Permanent key, hex
        #[arg(short = 'k', long)]
        key: String,
    },

    /// Generate a Milenage-256 authentication vector
    Generate {
        /// Permanent key, hex; unwrapped from --key-label/--cipher when absent
        #[arg(short = 'k', long)]
        key: Option<String>,

        #[command(flatten)]
        wrapped: UnwrapArgs,

        /// Precomputed OPc, hex
        #[arg(long)]
        opc: Option<String>,

        /// RAND, hex
        #[arg(short = 'r', long)]
        rand: String,

        /// SQN, hex
        #[arg(short = 's', long)]
        sqn: String,

        /// AMF, hex
        #[arg(short = 'a', long, default_value = "8000")]
        amf: String,
    },
}

#[derive(ClapArgs, Debug)]
struct UnwrapArgs {
    /// Protecting key label
    #[arg(long, default_value = "")]
    key_label: String,

    /// Encrypted permanent key
    #[arg(long, default_value = "")]
    cipher: String,

    /// Inline protecting key, hex (local custodian only)
    #[arg(long)]
    protecting_key: Option<String>,

    /// SSM algorithm identifier
    #[arg(long, default_value = "0")]
    encryption_algorithm: i32,

    /// SSM key identifier
    #[arg(long, default_value = "0")]
    id: i32,

    /// Initialization vector
    #[arg(long, default_value = "")]
    iv: String,

    /// AES-GCM tag (selects the AEAD decrypt)
    #[arg(long)]
    tag: Option<String>,

    /// AES-GCM additional authenticated data
    #[arg(long)]
    aad: Option<String>,
}

impl From<UnwrapArgs> for UnwrapRequest {
    fn from(args: UnwrapArgs) -> Self {
        Self {
            key_label: args.key_label,
            cipher: args.cipher,
            encryption_algorithm: args.encryption_algorithm,
            id: args.id,
            iv: args.iv,
            tag: args.tag,
            aad: args.aad,
            protecting_key: args.protecting_key,
        }
    }
}

#[derive(Serialize)]
struct UnwrapOutput<'a> {
    key: &'a str,
    encoding: &'static str,
}

#[derive(Serialize)]
struct OpcOutput {
    opc: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args)?;

    log::info!("NextGCore UDM Key Tool v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = if std::path::Path::new(&args.config).exists() {
        log::info!("Loading configuration from {}", args.config);
        UdmKeyConfig::from_file(&args.config)
            .with_context(|| format!("Failed to load configuration {}", args.config))?
    } else {
        log::warn!("Configuration file not found: {}, using defaults", args.config);
        UdmKeyConfig::default()
    };

    let generator = AuthVectorGenerator::new(Arc::new(
        config
            .milenage_config()
            .context("Invalid Milenage-256 configuration")?,
    ));

    match args.command {
        Command::Unwrap(wrapped) => {
            let service =
                KeyUnwrapService::from_config(&config).context("Failed to create key unwrap service")?;
            let key = unwrap(&service, wrapped.into()).await?;
            print_json(&UnwrapOutput {
                key: key.as_str(),
                encoding: match key.encoding() {
                    KeyEncoding::Hex => "hex",
                    KeyEncoding::Base64 => "base64",
                },
            })?;
        }

        Command::Opc { key } => {
            let key = Zeroizing::new(hex::decode(&key).context("Invalid key hex")?);
            let opc = generator.opc(&key).context("OPc derivation failed")?;
            print_json(&OpcOutput { opc: hex::encode(opc) })?;
        }

        Command::Generate {
            key,
            wrapped,
            opc,
            rand,
            sqn,
            amf,
        } => {
            let key_bytes = match key {
                Some(key) => Zeroizing::new(hex::decode(&key).context("Invalid key hex")?),
                None => {
                    let service = KeyUnwrapService::from_config(&config)
                        .context("Failed to create key unwrap service")?;
                    let key = unwrap(&service, wrapped.into()).await?;
                    key.to_bytes().context("Unwrapped key is not decodable")?
                }
            };

            let av = generator
                .generate_hex(&key_bytes, opc.as_deref(), &rand, &sqn, &amf)
                .context("Vector generation failed")?;
            print_json(&av)?;
        }
    }

    Ok(())
}

async fn unwrap(
    service: &KeyUnwrapService,
    request: UnwrapRequest,
) -> Result<PermanentKey> {
    match service.unwrap(&request).await {
        Ok(key) => Ok(key),
        Err(e) => {
            let problem = serde_json::to_string(&e.to_problem_details())?;
            anyhow::bail!("Key unwrap failed: {problem}")
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Initialize logging
fn init_logging(args: &Args) -> Result<()> {
    let mut builder = env_logger::Builder::new();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "info" => log::LevelFilter::Info,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        _ => log::LevelFilter::Info,
    };
    builder.filter_level(level);
    builder.format_timestamp_millis();

    if args.no_color {
        builder.write_style(env_logger::WriteStyle::Never);
    }

    // Keep stdout for command output
    builder.target(env_logger::Target::Stderr);
    builder.init();

    Ok(())
}
