use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};
use content_tree::store::{self, DatasourceKind};
use content_tree::tree::{Section, SectionNode, SiteNode};
use content_tree::{ContentItem, Settings};

#[derive(Parser)]
#[command(
    name = "content_tree",
    about = "Extract heading-structured content from a website or a .docx file"
)]
struct Cli {
    /// Settings file (TOML, JSON or YAML). Defaults to ./content_tree.* if present
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl a site from a seed URL and extract its content
    Website {
        url: String,
        /// Max link hops from the seed
        #[arg(short = 'd', long, default_value = "1")]
        depth: usize,
        /// Abort the whole run after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
        /// Save extracted items to this SQLite database
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Extract the content of a .docx file
    Document {
        path: PathBuf,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
        /// Save extracted items to this SQLite database
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Show database statistics
    Stats {
        #[arg(long)]
        db: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref()).context("loading settings")?;

    let result = match cli.command {
        Commands::Website {
            url,
            depth,
            timeout,
            json,
            db,
        } => {
            settings.crawl.show_progress |= !json;
            let run = content_tree::extract_from_website(&url, depth, &settings);
            let extraction = match timeout {
                Some(secs) => tokio::time::timeout(Duration::from_secs(secs), run)
                    .await
                    .with_context(|| format!("crawl of {} timed out after {}s", url, secs))??,
                None => run.await?,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&extraction)?);
            } else {
                let report = &extraction.report;
                println!(
                    "Crawled {} pages ({} failed), {} items",
                    report.pages_fetched,
                    report.pages_failed(),
                    extraction.items.len()
                );
                for failed in &report.failed {
                    println!("  failed: {} ({})", truncate(&failed.url, 60), failed.error);
                }
                println!("\n--- Site ---");
                print_site(&extraction.site_tree, 0);
                println!("\n--- Sections ---");
                print_sections(&extraction.section_tree, 0);
            }

            if let Some(path) = db {
                save(&path, DatasourceKind::Website, &url, &extraction.items, &settings)?;
            }
            Ok(())
        }
        Commands::Document { path, json, db } => {
            let extraction = content_tree::extract_from_document(&path, &settings)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&extraction)?);
            } else {
                println!(
                    "{}: {} items, {} warnings",
                    extraction.title,
                    extraction.items.len(),
                    extraction.warnings.len()
                );
                for w in &extraction.warnings {
                    println!("  warning: {}", w);
                }
                println!();
                print_outline(&extraction.sections, 0);
            }

            if let Some(db) = db {
                let target = path.display().to_string();
                save(&db, DatasourceKind::Document, &target, &extraction.items, &settings)?;
            }
            Ok(())
        }
        Commands::Stats { db } => {
            let conn = store::connect(&db)?;
            store::init_schema(&conn)?;
            let s = store::get_stats(&conn)?;
            println!("Datasources: {}", s.datasources);
            println!("  websites:  {}", s.websites);
            println!("  documents: {}", s.documents);
            println!("Paragraphs:  {}", s.paragraphs);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn save(
    db: &Path,
    kind: DatasourceKind,
    target: &str,
    items: &[ContentItem],
    settings: &Settings,
) -> anyhow::Result<()> {
    let conn = store::connect(db)?;
    store::init_schema(&conn)?;
    let id = store::create_datasource(&conn, kind, target)?;
    let saved = store::save_items(&conn, id, items, settings.store.min_chars)
        .with_context(|| format!("saving items to {}", db.display()))?;
    println!(
        "Saved {} of {} items to {} (datasource {})",
        saved,
        items.len(),
        db.display(),
        id
    );
    Ok(())
}

fn print_site(node: &SiteNode, depth: usize) {
    let marker = if node.source_url.is_some() { "" } else { " (no page)" };
    println!("{}{}{}", "  ".repeat(depth), truncate(&node.title, 60), marker);
    for child in &node.children {
        print_site(child, depth + 1);
    }
}

fn print_sections(node: &SectionNode, depth: usize) {
    println!(
        "{}{} [{}]",
        "  ".repeat(depth),
        truncate(&node.title, 60),
        node.items.len()
    );
    for child in &node.children {
        print_sections(child, depth + 1);
    }
}

fn print_outline(section: &Section, depth: usize) {
    let pad = "  ".repeat(depth);
    println!("{}# {}", pad, truncate(&section.title, 70));
    for p in &section.paragraphs {
        println!("{}  {}", pad, truncate(p, 80));
    }
    for list in &section.lists {
        for (i, entry) in list.items.iter().enumerate() {
            if list.ordered {
                println!("{}  {}. {}", pad, i + 1, truncate(entry, 76));
            } else {
                println!("{}  - {}", pad, truncate(entry, 76));
            }
        }
    }
    for t in &section.tables {
        println!("{}  [table] {}", pad, truncate(t, 72));
    }
    for sub in &section.subsections {
        print_outline(sub, depth + 1);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

// ── Tests ──
