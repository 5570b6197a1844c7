use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::LevelFilter;

use cipherlab_core::{
    ecc, elgamal, rsa, AesMode, Algorithm, AlgorithmId, Catalog, PrimeRange, StepLog, Tracer,
};

#[derive(Parser)]
#[command(
    name = "cipherlab",
    author,
    version,
    about = "Educational cryptography engine (not for production use)"
)]
struct Cli {
    /// Enable debug logging.
    #[arg(long, global = true)]
    debug: bool,
    /// Print the step-by-step trace of the operation.
    #[arg(long, global = true)]
    trace: bool,
    /// AES mode of operation.
    #[arg(long, global = true, value_enum, default_value = "ecb")]
    aes_mode: AesModeArg,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AesModeArg {
    Ecb,
    Cbc,
    Ctr,
}

impl From<AesModeArg> for AesMode {
    fn from(arg: AesModeArg) -> Self {
        match arg {
            AesModeArg::Ecb => AesMode::Ecb,
            AesModeArg::Cbc => AesMode::Cbc,
            AesModeArg::Ctr => AesMode::Ctr,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KeygenAlgorithm {
    Rsa,
    Elgamal,
    Ecdh,
}

#[derive(Subcommand)]
enum Commands {
    /// List every algorithm in the catalog.
    List,
    /// Show an algorithm's key requirements.
    Requirements { algorithm: String },
    /// Check a key against an algorithm's rules.
    ValidateKey { algorithm: String, key: String },
    /// Generate a key pair for an asymmetric scheme.
    Keygen {
        #[arg(value_enum)]
        algorithm: KeygenAlgorithm,
        /// Use the smaller RSA prime range.
        #[arg(long)]
        small: bool,
        /// Also write the pair as JSON to this file.
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Encrypt (or hash/sign, depending on the algorithm).
    Encrypt {
        algorithm: String,
        text: String,
        #[arg(long, default_value = "")]
        key: String,
    },
    /// Decrypt (or verify, depending on the algorithm).
    Decrypt {
        algorithm: String,
        text: String,
        #[arg(long, default_value = "")]
        key: String,
    },
    /// Hash a text with SHA-256.
    Hash { text: String },
    /// Sign a document with the built-in signature scheme.
    Sign { document: String },
    /// Verify a signed blob.
    Verify { blob: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_env(Env::default())
        .filter_level(level)
        .init();

    let catalog = Catalog::with_aes_mode(cli.aes_mode.into());
    match &cli.command {
        Commands::List => list(&catalog),
        Commands::Requirements { algorithm } => {
            let entry = lookup(&catalog, algorithm)?;
            println!("{}", entry.key_requirements());
        }
        Commands::ValidateKey { algorithm, key } => {
            let entry = lookup(&catalog, algorithm)?;
            let check = entry.validate_key(key);
            if check.valid {
                println!("key is valid");
            } else {
                println!("key is invalid: {}", check.error.unwrap_or_default());
            }
        }
        Commands::Keygen {
            algorithm,
            small,
            out,
        } => keygen(*algorithm, *small, out.as_deref(), cli.trace)?,
        Commands::Encrypt {
            algorithm,
            text,
            key,
        } => transform(&catalog, algorithm, text, key, true, cli.trace)?,
        Commands::Decrypt {
            algorithm,
            text,
            key,
        } => transform(&catalog, algorithm, text, key, false, cli.trace)?,
        Commands::Hash { text } => transform(&catalog, "sha-256", text, "", true, cli.trace)?,
        Commands::Sign { document } => {
            transform(&catalog, "signature", document, "", true, cli.trace)?
        }
        Commands::Verify { blob } => {
            transform(&catalog, "signature", blob, "", false, cli.trace)?
        }
    }
    Ok(())
}

fn list(catalog: &Catalog) {
    for (id, info) in catalog.entries() {
        println!("{:<12} {:<42} [{}]", id.as_str(), info.name, info.category.label());
    }
}

fn lookup<'a>(catalog: &'a Catalog, id: &str) -> Result<&'a dyn Algorithm> {
    let parsed = AlgorithmId::parse(id).with_context(|| {
        let known: Vec<&str> = AlgorithmId::ALL.iter().map(|a| a.as_str()).collect();
        format!(
            "unknown algorithm \"{id}\"; expected one of: {}",
            known.join(", ")
        )
    })?;
    catalog
        .get(parsed)
        .with_context(|| format!("algorithm \"{id}\" is not registered"))
}

fn keygen(
    algorithm: KeygenAlgorithm,
    small: bool,
    out: Option<&std::path::Path>,
    trace: bool,
) -> Result<()> {
    if small && !matches!(algorithm, KeygenAlgorithm::Rsa) {
        bail!("--small applies only to rsa");
    }

    let mut log = StepLog::new();
    let mut tracer = if trace {
        Tracer::new(&mut log)
    } else {
        Tracer::disabled()
    };

    let json = match algorithm {
        KeygenAlgorithm::Rsa => {
            let range = if small {
                PrimeRange::SMALL
            } else {
                PrimeRange::DEFAULT
            };
            let pair = rsa::generate_key_pair(range, &mut tracer);
            println!("public key:  {}", pair.format_public());
            println!("private key: {}", pair.format_private());
            serde_json::to_string_pretty(&pair)?
        }
        KeygenAlgorithm::Elgamal => {
            let pair = elgamal::generate_key_pair(&mut tracer);
            println!("public key:  {}", pair.format_public());
            println!("private key: {}", pair.format_private());
            serde_json::to_string_pretty(&pair)?
        }
        KeygenAlgorithm::Ecdh => {
            let pair = ecc::generate_key_pair(&mut tracer);
            println!("public key:  {}", pair.format_public());
            println!("private key: {}", pair.format_private());
            serde_json::to_string_pretty(&pair)?
        }
    };

    if let Some(path) = out {
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        println!("key pair written to {}", path.display());
    }
    print_trace(&log);
    Ok(())
}

fn transform(
    catalog: &Catalog,
    algorithm: &str,
    text: &str,
    key: &str,
    encrypt: bool,
    trace: bool,
) -> Result<()> {
    let entry = lookup(catalog, algorithm)?;
    let mut log = StepLog::new();
    let mut tracer = if trace {
        Tracer::new(&mut log)
    } else {
        Tracer::disabled()
    };

    let result = if encrypt {
        let mut rng = cipherlab_core::default_rng();
        entry.encrypt(text, key, &mut rng, &mut tracer)
    } else {
        entry.decrypt(text, key, &mut tracer)
    };

    match result {
        Ok(output) => println!("{output}"),
        Err(e) => bail!("{algorithm}: {e}"),
    }
    print_trace(&log);
    Ok(())
}

fn print_trace(log: &StepLog) {
    for step in log.steps() {
        let mut line = format!("  [{}] {}", step.index, step.description);
        if let Some(before) = &step.before {
            line.push_str(&format!(" | in: {before}"));
        }
        if let Some(after) = &step.after {
            line.push_str(&format!(" | out: {after}"));
        }
        if let Some(detail) = &step.detail {
            line.push_str(&format!(" ({detail})"));
        }
        eprintln!("{line}");
    }
}
