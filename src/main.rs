//! # Loanform CLI
//!
//! Usage:
//!   loanform render request.json -o contract.pdf
//!   echo '{ ... }' | loanform text
//!   loanform submit request.json --share
//!   loanform example --return > request.json

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use loanform::clock::SystemClock;
use loanform::compose::compose_document;
use loanform::config::GatewayConfig;
use loanform::contract::{build_contract_text, ContractExtra};
use loanform::gateway::{NoShare, ShareTarget, SystemShare};
use loanform::layout::OverflowPolicy;
use loanform::model::ContractRequest;
use loanform::storage::{contract_file_name, save_contract, save_contract_as};
use loanform::workflow::ContractTransaction;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose a contract and write the PDF
    Render {
        /// Request JSON file (stdin when omitted)
        input: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Keep everything on one page even if it runs past the margin
        #[arg(long)]
        single_page: bool,
    },
    /// Print the contract clause text
    Text {
        input: Option<PathBuf>,
    },
    /// Compose, save, upload, register the loan and optionally share
    Submit {
        input: Option<PathBuf>,
        /// Open the saved contract with the system handler
        #[arg(long)]
        share: bool,
    },
    /// Print an example request
    Example {
        /// A return instead of a loan opening
        #[arg(long = "return")]
        is_return: bool,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("✗ {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let clock = SystemClock;

    match cli.command {
        Commands::Render {
            input,
            output,
            single_page,
        } => {
            let request = read_request(input.as_deref())?;
            let mut config = loanform::contract_config(&request, &clock)?;
            if single_page {
                config.overflow = OverflowPolicy::Overlap;
            }
            let document = compose_document(&config)?;

            let path = match output {
                Some(path) => save_contract_as(&path, &document.bytes)?,
                None => save_contract(
                    Path::new("."),
                    &contract_file_name(request.kind, &clock),
                    &document.bytes,
                )?,
            };
            eprintln!(
                "✓ Written {} bytes ({} page(s)) to {}",
                document.bytes.len(),
                document.page_count(),
                path.display()
            );
        }

        Commands::Text { input } => {
            let request = read_request(input.as_deref())?;
            let extra = ContractExtra {
                cellphone: request.cellphone.clone(),
            };
            println!(
                "{}",
                build_contract_text(
                    request.kind,
                    &request.party,
                    &request.object,
                    &request.custodian_name,
                    &extra,
                    &clock,
                )
            );
        }

        Commands::Submit { input, share } => {
            let request = read_request(input.as_deref())?;
            let config = GatewayConfig::from_env()?;
            let assets = config.asset_host()?;
            let registry = config.loan_registry()?;
            let share_target: &dyn ShareTarget = if share { &SystemShare } else { &NoShare };

            let outcome = ContractTransaction {
                output_dir: &config.output_dir,
                assets: assets.as_ref(),
                registry: &registry,
                share_target,
                clock: &clock,
            }
            .run(&request, share)?;

            eprintln!("✓ Saved {}", outcome.path.display());
            println!("{}", outcome.url);
        }

        Commands::Example { is_return } => {
            print!("{}", example_request_json(is_return));
        }
    }

    Ok(())
}

fn read_request(input: Option<&Path>) -> Result<ContractRequest> {
    let json = match input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };
    let request: ContractRequest = serde_json::from_str(&json).map_err(loanform::ContractError::from)?;
    Ok(request)
}

fn example_request_json(is_return: bool) -> String {
    let (kind, loan_id) = if is_return {
        ("loanReturn", "\n  \"loanId\": \"6650f1c2a9e4b2d3c4e5f601\",")
    } else {
        ("loanOpening", "")
    };
    format!(
        r##"{{
  "kind": "{kind}",{loan_id}
  "party": {{
    "_id": "664e2b7f1d3a4c5e6f708192",
    "name": "Ana",
    "surName": "Ruiz",
    "tuition": "123456"
  }},
  "object": {{
    "_id": "65f0a1b2c3d4e5f607182930",
    "NOMBRE": "Taladro inalámbrico",
    "Lugar": "FABLAB"
  }},
  "custodianName": "Carlos Méndez",
  "cellphone": "614-555-0100",
  "headerImage": "./assets/ulsa_logo.png",
  "signatures": {{
    "custodian": "./signatures/custodian.png",
    "counterparty": "./signatures/counterparty.png"
  }}
}}
"##
    )
}
