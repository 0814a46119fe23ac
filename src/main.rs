use bzip2::read::BzDecoder;
use chrono::{SecondsFormat, Utc};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use unicode_normalization::UnicodeNormalization;

mod normalize;
mod roots;
mod scan;

use roots::build_root_index;
use scan::Scanner;

#[derive(Parser)]
#[command(name = "wordbook-rust")]
#[command(about = "Fast Rust-based wordbook scanner - extracts word entries and a root/affix index")]
struct Args {
    /// Input page dump (.txt or .txt.bz2), pages separated by form feeds
    input: PathBuf,

    /// Output JSON file
    output: PathBuf,

    /// Source name recorded in the output metadata (default: input file name)
    #[arg(long)]
    source_name: Option<String>,

    /// Limit number of pages to scan (for testing)
    #[arg(long)]
    page_limit: Option<usize>,

    /// Quiet mode - minimal output
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Meta {
    source_name: String,
    generated_at: String,
    entry_count: usize,
    root_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
struct Payload {
    meta: Meta,
    roots: Vec<roots::RootEntry>,
    entries: Vec<scan::Entry>,
}

/// Split an NFC-normalized page dump into page texts. Pages are separated by
/// form feeds (the `pdftotext` convention); the extractor leaves one trailing
/// form feed, so a final empty page is dropped.
fn split_pages(text: &str) -> Vec<String> {
    let normalized: String = text.nfc().collect();
    let mut pages: Vec<String> = normalized.split('\u{000C}').map(str::to_string).collect();
    if pages.last().map_or(false, |page| page.trim().is_empty()) {
        pages.pop();
    }
    pages
}

fn read_pages(path: &Path) -> std::io::Result<Vec<String>> {
    let file = File::open(path)?;
    let mut text = String::new();
    if path.to_string_lossy().ends_with(".bz2") {
        BufReader::with_capacity(256 * 1024, BzDecoder::new(file)).read_to_string(&mut text)?;
    } else {
        BufReader::with_capacity(256 * 1024, file).read_to_string(&mut text)?;
    }
    Ok(split_pages(&text))
}

fn main() -> std::io::Result<()> {
    let args = Args::parse();

    if !args.quiet {
        println!("Scanning: {}", args.input.display());
        println!("Output: {}", args.output.display());
        if let Some(limit) = args.page_limit {
            println!("Limit: {} pages", limit);
        }
        println!();
    }

    let start_time = Instant::now();

    let pages = read_pages(&args.input)?;
    let page_count = args.page_limit.map_or(pages.len(), |limit| limit.min(pages.len()));

    let pb = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}").unwrap());
        pb
    };

    let mut scanner = Scanner::new();
    for (index, page) in pages[..page_count].iter().enumerate() {
        scanner.scan_page(index + 1, page);
        pb.set_message(format!(
            "Pages: {}/{} | Entries: {}",
            index + 1,
            page_count,
            scanner.entry_count()
        ));
    }
    pb.finish_and_clear();

    let stats = scanner.stats.clone();
    let entries = scanner.into_entries();
    let roots = build_root_index(&entries);

    let source_name = args.source_name.clone().unwrap_or_else(|| {
        args.input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| args.input.display().to_string())
    });

    let payload = Payload {
        meta: Meta {
            source_name,
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            entry_count: entries.len(),
            root_count: roots.len(),
        },
        roots,
        entries,
    };

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let output = File::create(&args.output)?;
    let mut writer = BufWriter::with_capacity(256 * 1024, output);
    serde_json::to_writer_pretty(&mut writer, &payload)?;
    writer.flush()?;

    if !args.quiet {
        let elapsed = start_time.elapsed();
        println!();
        println!("============================================================");
        println!("Pages scanned: {}", stats.pages_scanned);
        println!("Lines scanned: {}", stats.lines_scanned);
        println!("Noise lines: {}", stats.noise_lines);
        println!("Unmatched lines: {}", stats.unmatched_lines);
        println!("Rejected words: {}", stats.rejected_words);
        println!("Empty decompositions: {}", stats.empty_decompositions);
        println!("Duplicate triples: {}", stats.duplicate_triples);
        println!("Bracket entries: {}", stats.bracket_entries);
        println!("Paren entries: {}", stats.paren_entries);
        println!("Time: {}m {}s", elapsed.as_secs() / 60, elapsed.as_secs() % 60);
        println!("============================================================");
    }
    println!(
        "wrote {} with {} entries and {} roots",
        args.output.display(),
        payload.meta.entry_count,
        payload.meta.root_count
    );

    Ok(())
}

#[cfg(test)]
mod driver_tests {
    use super::*;

    // ─────────────────────────────────────────────────────────────
    // Page splitting
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn splits_on_form_feed() {
        let pages = split_pages("page one\u{000C}page two");
        assert_eq!(pages, vec!["page one", "page two"]);
    }

    #[test]
    fn drops_trailing_empty_page() {
        let pages = split_pages("page one\u{000C}page two\u{000C}");
        assert_eq!(pages.len(), 2);
    }

    #[test]
    fn single_page_without_separator() {
        let pages = split_pages("just one page");
        assert_eq!(pages, vec!["just one page"]);
    }

    #[test]
    fn empty_dump_yields_no_pages() {
        assert!(split_pages("").is_empty());
    }

    #[test]
    fn recomposes_combining_accents() {
        // e + combining acute arrives as two scalars from some extractors;
        // NFC folds it so word validation sees a single non-ASCII char.
        let pages = split_pages("cafe\u{0301}");
        assert_eq!(pages, vec!["café"]);
    }

    // ─────────────────────────────────────────────────────────────
    // Payload shape
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn meta_serializes_camel_case() {
        let meta = Meta {
            source_name: "wordbook.txt".to_string(),
            generated_at: "2026-01-01T00:00:00Z".to_string(),
            entry_count: 1,
            root_count: 0,
        };
        let json = serde_json::to_string(&meta).unwrap();
        assert!(json.contains("\"sourceName\""));
        assert!(json.contains("\"generatedAt\""));
        assert!(json.contains("\"entryCount\":1"));
        assert!(json.contains("\"rootCount\":0"));
    }

    #[test]
    fn payload_has_three_top_level_fields() {
        let mut scanner = Scanner::new();
        scanner.scan_page(1, "predict 预测 (pre+dict)\ndictate 口述 (dict 说+ate)");
        let entries = scanner.into_entries();
        let roots = build_root_index(&entries);
        let payload = Payload {
            meta: Meta {
                source_name: "wordbook.txt".to_string(),
                generated_at: "2026-01-01T00:00:00Z".to_string(),
                entry_count: entries.len(),
                root_count: roots.len(),
            },
            roots,
            entries,
        };
        let value: serde_json::Value = serde_json::from_str(&serde_json::to_string(&payload).unwrap()).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 3);
        assert!(object.contains_key("meta"));
        assert!(object.contains_key("roots"));
        assert!(object.contains_key("entries"));
        assert_eq!(value["entries"][0]["id"], "e1");
        assert_eq!(value["roots"][0]["root"], "dict");
    }
}
