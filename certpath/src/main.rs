//! certpath: Command-line X.509 certificate chain building and verification.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::path::PathBuf;

use certpath_lib::{
    der_to_pem, find_system_ca_bundle, parse_pem_chain, verify_chain_from_der, ChainVerifyReport,
    KeyPurpose, VerifyChainOptions,
};

#[derive(Parser)]
#[command(
    name = "certpath",
    about = "Build and verify X.509 certificate chains against trust anchors",
    long_about = "certpath discovers and verifies certificate paths from a target\n\
                  certificate to a trust anchor, RFC 5280 style: it searches the\n\
                  supplied intermediate pool for candidate chains, verifies each\n\
                  (validity, signatures, constraints, policies), and reports the\n\
                  best path found with structured diagnostics.",
    after_help = "EXAMPLES:\n\
                  \n  certpath verify --ca-file roots.pem chain.pem\
                  \n  certpath verify --use-system-roots --untrusted intermediates.pem cert.pem\
                  \n  certpath verify --ca-file roots.pem --purpose sslserver --json chain.pem\
                  \n  certpath verify --ca-file roots.pem --all-paths chain1.pem chain2.pem"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify certificate chains against trust anchors
    Verify {
        /// PEM chain files to verify; the first certificate in each file is
        /// the target, the rest join the untrusted intermediate pool
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// PEM file of trust anchors
        #[arg(long)]
        ca_file: Option<PathBuf>,
        /// Use the system CA bundle as trust anchors
        #[arg(long)]
        use_system_roots: bool,
        /// PEM file of additional untrusted intermediates (repeatable)
        #[arg(long)]
        untrusted: Vec<PathBuf>,
        /// Verify at a specific Unix timestamp instead of the current time
        #[arg(long)]
        at_time: Option<i64>,
        /// Required key purpose: any, sslserver, or sslclient
        #[arg(long, default_value = "any")]
        purpose: String,
        /// Require the purpose on the target EKU itself (no anyExtendedKeyUsage)
        #[arg(long)]
        strict: bool,
        /// Keep exploring after the first valid path and report all of them
        #[arg(long)]
        all_paths: bool,
        /// Chain depth limit, target inclusive (0 = unlimited)
        #[arg(long, default_value_t = 0)]
        depth_limit: u32,
        /// Search iteration limit (0 = unlimited)
        #[arg(long, default_value_t = 0)]
        iteration_limit: u32,
        /// Print the best chain found as PEM
        #[arg(long)]
        show_chain: bool,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

fn resolve_purpose(name: &str, strict: bool) -> Result<KeyPurpose> {
    match (name, strict) {
        ("any", _) => Ok(KeyPurpose::Any),
        ("sslserver", false) => Ok(KeyPurpose::ServerAuth),
        ("sslserver", true) => Ok(KeyPurpose::ServerAuthStrict),
        ("sslclient", false) => Ok(KeyPurpose::ClientAuth),
        ("sslclient", true) => Ok(KeyPurpose::ClientAuthStrict),
        _ => anyhow::bail!("unknown purpose '{}' (expected any, sslserver, or sslclient)", name),
    }
}

fn load_anchors(ca_file: Option<&PathBuf>, use_system_roots: bool) -> Result<Vec<Vec<u8>>> {
    let path = match ca_file {
        Some(path) => path.clone(),
        None if use_system_roots => find_system_ca_bundle()
            .context("no system CA bundle found; pass --ca-file explicitly")?,
        None => anyhow::bail!("no trust anchors: pass --ca-file or --use-system-roots"),
    };
    let data =
        std::fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
    parse_pem_chain(&data).with_context(|| format!("failed to parse {}", path.display()))
}

fn verify_one(
    file: &PathBuf,
    extra_intermediates: &[Vec<u8>],
    anchors: &[Vec<u8>],
    options: &VerifyChainOptions,
) -> Result<ChainVerifyReport> {
    let data = std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let ders = parse_pem_chain(&data).with_context(|| format!("failed to parse {}", file.display()))?;
    let (leaf, rest) = ders
        .split_first()
        .context("no certificates found in chain file")?;

    let mut intermediates: Vec<Vec<u8>> = rest.to_vec();
    intermediates.extend_from_slice(extra_intermediates);

    verify_chain_from_der(leaf, &intermediates, anchors, options)
        .with_context(|| format!("failed to verify {}", file.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Verify {
            files,
            ca_file,
            use_system_roots,
            untrusted,
            at_time,
            purpose,
            strict,
            all_paths,
            depth_limit,
            iteration_limit,
            show_chain,
            json,
        } => {
            let anchors = load_anchors(ca_file.as_ref(), use_system_roots)?;

            let mut extra_intermediates = Vec::new();
            for path in &untrusted {
                let data = std::fs::read(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                extra_intermediates.extend(
                    parse_pem_chain(&data)
                        .with_context(|| format!("failed to parse {}", path.display()))?,
                );
            }

            let options = VerifyChainOptions {
                at_time,
                key_purpose: resolve_purpose(&purpose, strict)?,
                iteration_limit,
                depth_limit,
                explore_all_paths: all_paths,
                ..VerifyChainOptions::default()
            };

            let reports: Vec<(PathBuf, Result<ChainVerifyReport>)> = files
                .par_iter()
                .map(|file| {
                    let report = verify_one(file, &extra_intermediates, &anchors, &options);
                    (file.clone(), report)
                })
                .collect();

            let mut any_failed = false;
            for (file, report) in &reports {
                match report {
                    Ok(report) => {
                        if json {
                            println!("{}", report.to_json()?);
                        } else {
                            println!("{}: {}", file.display(), report);
                            if all_paths && report.valid_chain_count > 1 {
                                println!(
                                    "  {} valid paths out of {} explored",
                                    report.valid_chain_count, report.paths_explored
                                );
                            }
                            if show_chain {
                                for der in &report.best_chain_der {
                                    print!("{}", der_to_pem(der));
                                }
                            }
                        }
                        if !report.is_valid {
                            any_failed = true;
                        }
                    }
                    Err(e) => {
                        eprintln!("{}: error: {:#}", file.display(), e);
                        any_failed = true;
                    }
                }
            }

            if any_failed {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
