//! # acctpack CLI
//!
//! Command-line driver for the acctpack library.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser as ClapParser;
use serde::Serialize;

use acctpack::AcctpackError;
use acctpack::cli::Args;
use acctpack::counter::DailyCounterStore;
use acctpack::format::InputFormat;
use acctpack::session::{SessionId, SessionService};
use acctpack::tagger::{SourceTag, SystemClock};

/// Machine-readable result printed with `--json`.
#[derive(Serialize)]
struct Summary<'a> {
    input: &'a str,
    format: InputFormat,
    count: usize,
    tag: String,
    source: &'a SourceTag,
    output: PathBuf,
    mime_type: &'static str,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run() {
        eprintln!("❌ Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), AcctpackError> {
    let total_start = Instant::now();
    let args = <Args as ClapParser>::parse();
    let config = args.session_config();

    let file_name = Path::new(&args.input)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(&args.input)
        .to_string();

    if !args.json {
        println!("📦 acctpack v{}", env!("CARGO_PKG_VERSION"));
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!("📂 Input:   {}", args.input);
        println!("🏷️  Source:  {}", args.source);
        println!("💾 Output:  {}", args.output);
        println!("🕒 Offset:  UTC{:+}", config.tagger.utc_offset_hours);
        println!();
    }

    let bytes = fs::read(&args.input)?;
    let session = SessionId(i64::from(process::id()));
    let service = SessionService::new(
        config,
        Arc::new(DailyCounterStore::new()),
        Arc::new(SystemClock),
    );

    let parse_start = Instant::now();
    let preview = service.submit_file(session, &file_name, bytes.len() as u64, &bytes)?;
    if !args.json {
        println!("⏳ Reading {}...", preview.format);
        println!(
            "   Found {} Gmail accounts ({:.2}s)",
            preview.count,
            parse_start.elapsed().as_secs_f64()
        );
    }

    let delivery = service.submit_source_label(session, &args.source)?;
    let output = delivery.write_to(&args.output)?;

    if args.json {
        let summary = Summary {
            input: &args.input,
            format: preview.format,
            count: delivery.count,
            tag: delivery.tag.to_string(),
            source: &delivery.tag,
            output,
            mime_type: delivery.mime_type(),
        };
        let json = serde_json::to_string_pretty(&summary).map_err(io::Error::from)?;
        println!("{}", json);
        return Ok(());
    }

    println!();
    println!("{}", delivery.caption());
    println!("💾 Saved to {}", output.display());

    println!();
    println!("📊 Summary:");
    println!("   Records:   {}", delivery.count);
    println!("   Tag:       {}", delivery.tag);
    println!(
        "   Total time: {:.2}s",
        total_start.elapsed().as_secs_f64()
    );

    Ok(())
}
