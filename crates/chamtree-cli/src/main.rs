//! chamtree CLI
//!
//! Usage:
//!   chamtree keygen [--force]
//!   chamtree publish <path> [--block-size N] [--out summary.json]
//!   chamtree verify <summary.json>
//!   chamtree update <path> <summary.json> [--out summary.json]
//!   chamtree prove <summary.json> <leaf-hex>

use std::fs;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use chamtree_core::{
    from_hex, generate_keypair, meta, prove, to_hex, tree, verify_proof, MerkleConfig,
};

mod config;
use config::Config;

#[derive(Parser)]
#[command(name = "chamtree")]
#[command(about = "File distribution over chameleon-hash merkle trees", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a chameleon key pair and store it in the config
    Keygen {
        /// Replace existing keys
        #[arg(long)]
        force: bool,
    },
    /// Build a tree from a file and emit its published summary
    Publish {
        /// File to publish
        path: PathBuf,
        /// Block size in bytes (defaults to the configured value)
        #[arg(long)]
        block_size: Option<usize>,
        /// Write the summary here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Rebuild and verify a published summary
    Verify {
        /// Summary JSON file
        meta: PathBuf,
    },
    /// Publish new content under the same root (requires the secret key)
    Update {
        /// File with the new content
        path: PathBuf,
        /// Previously published summary JSON file
        meta: PathBuf,
        /// Block size in bytes (defaults to the configured value)
        #[arg(long)]
        block_size: Option<usize>,
        /// Write the updated summary here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate and check an inclusion proof for one leaf
    Prove {
        /// Summary JSON file
        meta: PathBuf,
        /// Leaf hash, 64 hex chars
        leaf: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // ctrl-c flips the token; builds poll it between block reads
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling");
            signal_cancel.cancel();
        }
    });

    match cli.command {
        Commands::Keygen { force } => keygen(force),
        Commands::Publish {
            path,
            block_size,
            out,
        } => publish(&path, block_size, out.as_deref(), &cancel),
        Commands::Verify { meta } => verify(&meta),
        Commands::Update {
            path,
            meta,
            block_size,
            out,
        } => update(&path, &meta, block_size, out.as_deref(), &cancel),
        Commands::Prove { meta, leaf } => prove_leaf(&meta, &leaf),
    }
}

fn keygen(force: bool) -> Result<()> {
    let mut config = Config::load()?;
    if config.keys.secret.is_some() && !force {
        bail!(
            "keys already present in {}; re-run with --force to replace them",
            config::config_path().display()
        );
    }

    let (secret, public) = generate_keypair();
    config.keys.secret = Some(hex::encode(secret.to_bytes()));
    config.keys.public = Some(hex::encode(public.serialize()));
    config.save()?;

    tracing::info!("keys written to {}", config::config_path().display());
    println!("{}", hex::encode(public.serialize()));
    Ok(())
}

fn publish(
    path: &Path,
    block_size: Option<usize>,
    out: Option<&Path>,
    cancel: &CancellationToken,
) -> Result<()> {
    let config = Config::load()?;
    let public = config.public_key()?;

    let mut file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let built = tree::build(&mut file, &merkle_config(&config, block_size), &public, cancel)?;

    let summary = meta::MetaData::from_tree(&built, &public);
    tracing::info!(
        "built tree with {} leaves, root {}",
        summary.leaves.len(),
        to_hex(&summary.root_hash)
    );

    write_summary(out, &meta::serialize(&summary)?)
}

fn verify(meta_path: &Path) -> Result<()> {
    let bytes = fs::read(meta_path)
        .with_context(|| format!("failed to read {}", meta_path.display()))?;
    let summary = meta::parse(&bytes)?;
    let verified = meta::rebuild_and_verify(&summary)?;

    println!(
        "root {} verified ({} leaves)",
        to_hex(&verified.root.hash),
        summary.leaves.len()
    );
    Ok(())
}

fn update(
    path: &Path,
    meta_path: &Path,
    block_size: Option<usize>,
    out: Option<&Path>,
    cancel: &CancellationToken,
) -> Result<()> {
    let config = Config::load()?;
    let secret = config.secret_key()?;

    let bytes = fs::read(meta_path)
        .with_context(|| format!("failed to read {}", meta_path.display()))?;
    let previous = meta::rebuild_and_verify(&meta::parse(&bytes)?)?;

    let mut file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let updated = tree::update(
        &mut file,
        &merkle_config(&config, block_size),
        &previous.public_key,
        &secret,
        &previous.root.hash,
        &previous.top_digest,
        &previous.randomness,
        cancel,
    )?;

    let summary = meta::MetaData::from_tree(&updated, &previous.public_key);
    tracing::info!(
        "root {} re-published with {} leaves",
        to_hex(&summary.root_hash),
        summary.leaves.len()
    );

    write_summary(out, &meta::serialize(&summary)?)
}

fn prove_leaf(meta_path: &Path, leaf_hex: &str) -> Result<()> {
    let bytes = fs::read(meta_path)
        .with_context(|| format!("failed to read {}", meta_path.display()))?;
    let verified = meta::rebuild_and_verify(&meta::parse(&bytes)?)?;

    let leaf = from_hex(leaf_hex).map_err(|_| anyhow::anyhow!("leaf must be 64 hex chars"))?;
    let Some(proof) = prove(&verified.root, &leaf) else {
        bail!("leaf {} is not in this tree", leaf_hex);
    };

    // one slot per line, empty line for an empty slot
    for slot in &proof {
        println!("{}", hex::encode(slot));
    }

    let ok = verify_proof(
        &verified.root.hash,
        &leaf,
        &proof,
        &verified.public_key,
        &verified.randomness,
    );
    if !ok {
        bail!("generated proof failed verification");
    }
    println!("proof valid ({} pairs)", proof.len() / 2);
    Ok(())
}

fn merkle_config(config: &Config, block_size: Option<usize>) -> MerkleConfig {
    MerkleConfig::new().with_block_size(block_size.unwrap_or(config.tree.block_size))
}

fn write_summary(out: Option<&Path>, json: &[u8]) -> Result<()> {
    match out {
        Some(path) => fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            let mut stdout = std::io::stdout();
            stdout.write_all(json)?;
            stdout.write_all(b"\n")?;
            Ok(())
        }
    }
}
