//! Replay a recorded order feed through a price level book
//!
//! Usage:
//!   plb-replay <input.ndjson> --symbol AAPL --source NTV --depth 10
//!
//! Each input line is one batch:
//!   {"new_snapshot": false, "records": [{"index": 1, "side": "BUY", "price": 10.0, "size": 5.0, "time": 1}]}
//!
//! Every notification is written to stdout as one JSON line. Logs go to stderr.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;
use serde_json::json;

use price_level_book::events::{EventFlags, OrderBatch, OrderEvent};
use price_level_book::mirror::{BookMirror, MirrorError};
use price_level_book::{BookConfig, LocalFeed, PriceLevelBook};
use types::ids::OrderIndex;
use types::order::Side;

#[derive(Parser)]
#[command(name = "plb-replay")]
#[command(about = "Replay order batches through a depth-limited price level book")]
struct Cli {
    /// NDJSON file with one batch per line ("-" reads stdin)
    input: PathBuf,
    /// Instrument symbol
    #[arg(long)]
    symbol: String,
    /// Feed source identifier
    #[arg(long, default_value = "DEFAULT")]
    source: String,
    /// Visible levels per side (0 = unbounded)
    #[arg(long, default_value_t = 0)]
    depth: usize,
    /// Rebuild the book from notifications and check it after every batch
    #[arg(long)]
    verify: bool,
}

#[derive(Debug, Deserialize)]
struct ReplayBatch {
    #[serde(default)]
    new_snapshot: bool,
    records: Vec<ReplayRecord>,
}

/// Order record as found in a recording. Missing price or size means NaN.
#[derive(Debug, Deserialize)]
struct ReplayRecord {
    index: i64,
    #[serde(default)]
    side: Side,
    price: Option<f64>,
    size: Option<f64>,
    #[serde(default)]
    time: i64,
    #[serde(default)]
    flags: u32,
}

impl From<ReplayRecord> for OrderEvent {
    fn from(record: ReplayRecord) -> Self {
        OrderEvent::new(
            OrderIndex::new(record.index),
            record.side,
            record.price.unwrap_or(f64::NAN),
            record.size.unwrap_or(f64::NAN),
            record.time,
        )
        .with_flags(EventFlags::new(record.flags))
    }
}

#[derive(Default)]
struct Verifier {
    mirror: BookMirror,
    errors: Vec<MirrorError>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let cli = Cli::parse();
    let config = BookConfig::new(cli.symbol, cli.source, cli.depth);

    let feed = LocalFeed::new();
    let book = PriceLevelBook::create(&feed, &config)?;
    let verifier = Arc::new(Mutex::new(Verifier::default()));

    let sink = Arc::clone(&verifier);
    book.set_on_new_book(move |levels| {
        println!("{}", json!({ "event": "new_book", "book": levels }));
        sink.lock().unwrap_or_else(PoisonError::into_inner).mirror.reset(levels);
    });

    let sink = Arc::clone(&verifier);
    book.set_on_incremental_change(move |changes| {
        println!("{}", json!({ "event": "incremental_change", "changes": changes }));
        let mut verifier = sink.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = verifier.mirror.apply(changes) {
            verifier.errors.push(e);
        }
    });

    book.set_on_book_update(|levels| {
        println!("{}", json!({ "event": "book_update", "book": levels }));
    });

    let reader: Box<dyn BufRead> = if cli.input.as_os_str() == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = File::open(&cli.input).with_context(|| format!("opening {}", cli.input.display()))?;
        Box::new(BufReader::new(file))
    };

    let symbol = book.symbol();
    let source = book.source();
    let mut batches = 0usize;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let parsed: ReplayBatch =
            serde_json::from_str(&line).with_context(|| format!("line {}: malformed batch", line_no + 1))?;

        let records = parsed.records.into_iter().map(OrderEvent::from).collect();
        let batch = OrderBatch::new(symbol.clone(), source.clone(), records);
        feed.publish(&batch, parsed.new_snapshot);
        batches += 1;

        if cli.verify {
            let verifier = verifier.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(err) = verifier.errors.first() {
                bail!("line {}: change-set does not apply: {}", line_no + 1, err);
            }
            if !verifier.mirror.matches(&book.snapshot()) {
                bail!("line {}: mirrored book diverged", line_no + 1);
            }
        }
    }

    tracing::info!(batches, orders = book.order_count(), "Replay finished");
    eprintln!("{}", serde_json::to_string_pretty(&book.metrics().export())?);

    Ok(())
}
