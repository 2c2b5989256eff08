use base64::Engine;
use clap::Parser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use vanity_core::{recover, search, SearchRequest, SearchStatus, StartPoint};

#[derive(Parser)]
#[command(name = "vanity-keygen")]
#[command(about = "Curve25519 vanity public-key search")]
struct Args {
    /// Base64 prefix to search for (standard alphabet, up to 43 chars)
    prefix: String,

    /// Starting seed, base64-encoded (32 bytes). Random if omitted.
    #[arg(long)]
    seed: Option<String>,

    /// Starting public key, base64-encoded (32-byte Montgomery
    /// u-coordinate), used instead of a seed. Private-key recovery is
    /// unavailable when searching from a public key alone.
    #[arg(long, conflicts_with = "seed")]
    from_pubkey: Option<String>,

    /// Number of worker threads
    #[arg(short, long, default_value_t = default_threads())]
    threads: usize,

    /// Candidates tested per modular inversion
    #[arg(long, default_value_t = 1024)]
    batch_size: usize,

    /// Stop after this many matches
    #[arg(long, default_value_t = 1)]
    count: usize,

    /// Stop after this many seconds with no match
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Run for 10 seconds against an unreachable prefix and report
    /// throughput, then exit
    #[arg(long)]
    benchmark: bool,
}

fn default_threads() -> usize {
    std::cmp::max(1, num_cpus::get().saturating_sub(1))
}

fn decode_b64_32(s: &str, what: &str) -> [u8; 32] {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(s)
        .unwrap_or_else(|e| {
            eprintln!("invalid base64 {}: {}", what, e);
            std::process::exit(2);
        });
    bytes.try_into().unwrap_or_else(|v: Vec<u8>| {
        eprintln!("{} must decode to exactly 32 bytes, got {}", what, v.len());
        std::process::exit(2);
    })
}

fn random_seed() -> [u8; 32] {
    use rand::RngCore;
    let mut seed = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut seed);
    seed
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_for_handler = Arc::clone(&cancel);
    ctrlc::set_handler(move || {
        eprintln!("\nsearch cancelled, stopping workers...");
        cancel_for_handler.store(true, Ordering::Relaxed);
    })
    .expect("failed to install Ctrl-C handler");

    if args.benchmark {
        run_benchmark(&args);
        return;
    }

    let seed = args.seed.as_deref().map(|s| decode_b64_32(s, "seed"));
    let start = if let Some(pk) = args.from_pubkey.as_deref() {
        StartPoint::PublicKey(decode_b64_32(pk, "public key"))
    } else {
        StartPoint::Seed(seed.unwrap_or_else(random_seed))
    };

    eprintln!("vanity-keygen");
    eprintln!("=============");
    eprintln!("prefix:  {}", args.prefix);
    eprintln!("threads: {}", args.threads);
    eprintln!("batch:   {}", args.batch_size);
    eprintln!();

    let req = SearchRequest {
        prefix: args.prefix.clone(),
        start,
        worker_count: args.threads,
        batch_size: args.batch_size,
        max_matches: args.count,
        deadline: args.timeout_secs.map(Duration::from_secs),
        cancel: Some(Arc::clone(&cancel)),
        candidate_limit_per_worker: None,
    };

    let start_time = Instant::now();
    let outcome = match search(req) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
    };
    let elapsed = start_time.elapsed();

    for m in &outcome.matches {
        let encoded = base64::engine::general_purpose::STANDARD.encode(m.public_key);
        println!("public_key: {}", encoded);
        println!("offset:     {}", m.offset);
        if let Some(seed) = seed {
            match recover(&seed, m.offset, &m.public_key) {
                Ok(scalar) => println!("private_key: {}", base64::engine::general_purpose::STANDARD.encode(scalar)),
                Err(e) => eprintln!("warning: could not recover private key: {}", e),
            }
        }
        println!();
    }

    eprintln!(
        "status: {:?}, attempts: {}, elapsed: {:.2}s",
        outcome.status,
        outcome.attempts,
        elapsed.as_secs_f64()
    );

    std::process::exit(match outcome.status {
        SearchStatus::Found => 0,
        SearchStatus::Exhausted | SearchStatus::TimedOut => 1,
        SearchStatus::Cancelled => 2,
    });
}

fn run_benchmark(args: &Args) {
    eprintln!("Benchmarking for 10 seconds with {} threads, batch size {}...", args.threads, args.batch_size);
    let req = SearchRequest {
        // a prefix no candidate can ever match, so the search runs for
        // the full deadline instead of stopping early
        prefix: "/".repeat(43),
        start: StartPoint::Seed(random_seed()),
        worker_count: args.threads,
        batch_size: args.batch_size,
        max_matches: 1,
        deadline: Some(Duration::from_secs(10)),
        cancel: None,
        candidate_limit_per_worker: None,
    };
    let outcome = search(req).expect("benchmark search should run");
    let rate = outcome.attempts as f64 / 10.0;
    eprintln!("{} candidates in 10s ({:.0} candidates/sec)", outcome.attempts, rate);
}
