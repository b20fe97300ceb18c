//! Generate and verify JWTs from the command line.
//!
//! Loads `.env` into the process environment if present, then reads
//! `JWT_SECRET` and the other `JWT_*` knobs.
//!
//! ```bash
//! cargo run --example token -- generate '{"username":"ana"}'
//! cargo run --example token -- verify eyJhbG...
//! ```

use jwt_helpers::env::load_dotenv_to_process;
use jwt_helpers::{
    generate_token, generate_token_with, parse_token, ClaimsMap, ClaimsSet, Environment,
    ParseOptions,
};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Missing .env is fine; the process environment may already be set.
    let _ = load_dotenv_to_process(None);

    let opts = match ParseOptions::from_env(&Environment::from_process()) {
        Ok(opts) => opts,
        Err(e) => fail(&e.to_string()),
    };

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        usage();
    }

    match args[0].as_str() {
        "generate" => {
            let result = match args.get(1) {
                None => generate_token(&opts.secret),
                Some(raw) => match serde_json::from_str::<ClaimsMap>(raw) {
                    Ok(map) => generate_token_with(&opts.secret, ClaimsSet::generic(map)),
                    Err(e) => fail(&format!("claims must be a JSON object: {e}")),
                },
            };
            match result {
                Ok(token) => println!("{token}"),
                Err(e) => fail(&e.to_string()),
            }
        }
        "verify" => {
            let token = args.get(1).unwrap_or_else(|| usage());
            match parse_token(token, &opts) {
                Ok(parsed) => {
                    println!("Valid ({:?})\n", parsed.header.alg);
                    for (name, value) in &parsed.claims {
                        println!("  {name:<4}: {value}");
                    }
                }
                Err(e) => fail(&format!("{} ({})", e, e.code())),
            }
        }
        _ => usage(),
    }
}

fn fail(msg: &str) -> ! {
    eprintln!("Error: {msg}");
    std::process::exit(1);
}

fn usage() -> ! {
    eprintln!("Usage:");
    eprintln!("  cargo run --example token -- generate [claims-json]");
    eprintln!("  cargo run --example token -- verify   <token>");
    std::process::exit(1);
}
