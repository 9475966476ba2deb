// src/main.rs - command-line driver for the ruckoo solver

//! Ruckoo main entry point.
//!
//! Parses the header and graph geometry, runs a solve, and prints the proofs
//! found, either human-readable or as JSON.
//!
//! # Version History
//! - 0.1.0: Initial solve command
//! - 0.2.0: Added the params command and JSON proof output

use std::time::Instant;

use clap::{Parser, Subcommand};
use ruckoo::{digest_header, init, Params, Result, RuckooError, Settings, Solver, SolverError};

#[derive(Parser)]
#[command(name = "ruckoo")]
#[command(about = "Lean-memory CPU solver for the Cuckoo Cycle proof-of-work")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve one header
    Solve {
        /// Header text, digested to 32 bytes with Blake2b-256
        #[arg(long, default_value = "")]
        header: String,
        /// 32-byte header as 64 hex chars, used verbatim (overrides --header)
        #[arg(long)]
        header_hex: Option<String>,
        /// log2 of the node space
        #[arg(long, default_value_t = 20)]
        sizeshift: u32,
        /// Cycle length to search for
        #[arg(long, default_value_t = 42)]
        proofsize: usize,
        /// Degree-counter partition bits (0 = no partitioning)
        #[arg(long, default_value_t = 0)]
        part_bits: u32,
        /// Worker threads (0 = one per logical CPU)
        #[arg(short, long, default_value_t = 1)]
        threads: u32,
        /// Trim rounds (0 = derive from part_bits)
        #[arg(short = 'n', long, default_value_t = 0)]
        ntrims: u32,
        /// Maximum solutions to keep
        #[arg(short, long, default_value_t = 8)]
        maxsols: u32,
        /// Emit proofs as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the derived geometry for a given size
    Params {
        /// log2 of the node space
        #[arg(long, default_value_t = 20)]
        sizeshift: u32,
        /// Cycle length
        #[arg(long, default_value_t = 42)]
        proofsize: usize,
        /// Degree-counter partition bits
        #[arg(long, default_value_t = 0)]
        part_bits: u32,
    },
}

fn main() -> Result<()> {
    init()?;

    let cli = Cli::parse();
    match cli.command {
        Commands::Solve {
            header,
            header_hex,
            sizeshift,
            proofsize,
            part_bits,
            threads,
            ntrims,
            maxsols,
            json,
        } => {
            let header = resolve_header(&header, header_hex.as_deref())?;
            solve(
                header, sizeshift, proofsize, part_bits, threads, ntrims, maxsols, json,
            )
        }
        Commands::Params {
            sizeshift,
            proofsize,
            part_bits,
        } => show_params(sizeshift, proofsize, part_bits),
    }
}

/// A 32-byte header, either verbatim from hex or digested from text.
fn resolve_header(text: &str, hex_header: Option<&str>) -> Result<[u8; 32]> {
    match hex_header {
        Some(hx) => {
            let bytes = hex::decode(hx.trim_start_matches("0x"))?;
            bytes.try_into().map_err(|_| {
                RuckooError::Config("header must be exactly 32 bytes of hex".to_string())
            })
        }
        None => Ok(digest_header(text.as_bytes())),
    }
}

#[allow(clippy::too_many_arguments)]
fn solve(
    header: [u8; 32],
    sizeshift: u32,
    proofsize: usize,
    part_bits: u32,
    threads: u32,
    ntrims: u32,
    maxsols: u32,
    json: bool,
) -> Result<()> {
    let params = Params::new(sizeshift, proofsize, part_bits)?;
    let settings = Settings {
        threads,
        trims: ntrims,
        max_sols: maxsols,
    };
    let solver = Solver::new(params, &settings)?;

    println!(
        "Looking for {}-cycles on cuckoo{} with {} trim rounds, {} memory",
        proofsize,
        sizeshift,
        if ntrims == 0 {
            params.default_trims()
        } else {
            ntrims
        },
        human_bytes(params.byte_count()),
    );

    let start = Instant::now();
    let proofs = match solver.solve(&header) {
        Ok(proofs) => proofs,
        Err(SolverError::Overloaded { load }) => {
            println!("graph overloaded at {}% after trimming; no solutions", load);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    let elapsed = start.elapsed();

    if json {
        println!("{}", serde_json::to_string_pretty(&proofs)?);
    } else {
        for (i, proof) in proofs.iter().enumerate() {
            let nonces: Vec<String> = proof.nonces.iter().map(|n| format!("{:x}", n)).collect();
            println!("Solution {}: {}", i + 1, nonces.join(" "));
        }
    }
    println!(
        "{} solution(s) in {:.2}s",
        proofs.len(),
        elapsed.as_secs_f64()
    );

    Ok(())
}

fn show_params(sizeshift: u32, proofsize: usize, part_bits: u32) -> Result<()> {
    let p = Params::new(sizeshift, proofsize, part_bits)?;
    println!("cuckoo{} geometry:", sizeshift);
    println!("Candidate edges: {}", p.halfsize);
    println!("Nodes per side: {}", p.halfsize);
    println!("Cuckoo table capacity: {}", p.cuckoo_size);
    println!("Max probe drift: {}", p.maxdrift);
    println!("Max path length: {}", p.maxpathlen);
    println!("Default trim rounds: {}", p.default_trims());
    println!("Peak memory: {}", human_bytes(p.byte_count()));
    Ok(())
}

fn human_bytes(mut bytes: u64) -> String {
    let mut unit = 0;
    while bytes >= 10240 {
        bytes >>= 10;
        unit += 1;
    }
    format!("{}{}B", bytes, [' ', 'K', 'M', 'G', 'T'][unit])
}
