mod catalog;
mod db;
mod error;
mod family;
mod inherit;
mod parser;
mod record;
mod sheets;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "datasheet_pipeline", about = "Vendor datasheet extraction and catalog enrichment")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse datasheet text files into per-language spec records
    Extract {
        /// Directory of extracted datasheet .txt files
        #[arg(short, long, default_value = "data/datasheets")]
        sheets: PathBuf,
        /// Max documents to parse (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Enrich the product catalog with extracted + inherited specs
    Enrich {
        /// Raw catalog JSON dump
        #[arg(short, long, default_value = "data/raw/products.json")]
        catalog: PathBuf,
    },
    /// Extract + enrich in one pipeline
    Run {
        #[arg(short, long, default_value = "data/datasheets")]
        sheets: PathBuf,
        #[arg(short, long, default_value = "data/raw/products.json")]
        catalog: PathBuf,
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Write per-language spec JSON and the enriched catalog
    Export {
        #[arg(short, long, default_value = "data/processed")]
        out: PathBuf,
    },
    /// Show pipeline statistics
    Stats,
    /// Enriched products overview table
    Overview {
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract { sheets, limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let mut docs = sheets::load_documents(&sheets)?;
            if let Some(n) = limit {
                docs.truncate(n);
            }
            if docs.is_empty() {
                println!("No datasheets found in {}.", sheets.display());
                return Ok(());
            }
            println!("Extracting {} datasheets...", docs.len());
            let counts = extract_documents(&conn, &docs)?;
            counts.print();
            Ok(())
        }
        Commands::Enrich { catalog } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            enrich_catalog(&conn, &catalog)
        }
        Commands::Run { sheets, catalog, limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;

            let t_extract = Instant::now();
            let mut docs = sheets::load_documents(&sheets)?;
            if let Some(n) = limit {
                docs.truncate(n);
            }
            println!("Pipeline: extracting {} datasheets...", docs.len());
            let counts = extract_documents(&conn, &docs)?;
            println!(
                "Extracted in {:.1}s",
                t_extract.elapsed().as_secs_f64()
            );
            counts.print();

            enrich_catalog(&conn, &catalog)
        }
        Commands::Export { out } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            export_all(&conn, &out)
        }
        Commands::Overview { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let rows = db::fetch_overview(&conn, limit)?;
            if rows.is_empty() {
                println!("No products found. Run 'enrich' first.");
                return Ok(());
            }

            println!(
                "{:>3} | {:<18} | {:<28} | {:<9} | {:<18} | {:<14}",
                "#", "SKU", "Name", "Specs", "Parent", "Datasheet"
            );
            println!("{}", "-".repeat(103));
            for (i, r) in rows.iter().enumerate() {
                println!(
                    "{:>3} | {:<18} | {:<28} | {:<9} | {:<18} | {:<14}",
                    i + 1,
                    truncate(&r.sku, 18),
                    truncate(&r.name, 28),
                    r.spec_source,
                    truncate(&r.parent_sku, 18),
                    truncate(&r.datasheet_ref, 14),
                );
            }
            println!("\n{} products", rows.len());
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Documents:       {}", s.documents);
            println!("  low yield:     {}", s.low_yield);
            println!("Spec records:    {}", s.records);
            for (lang, count) in &s.records_by_language {
                println!("  {}:            {}", lang, count);
            }
            println!("Products:        {}", s.products);
            println!("  own specs:     {}", s.own_specs);
            println!("  inherited:     {}", s.inherited_specs);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

struct ExtractCounts {
    documents: usize,
    records: usize,
    low_yield: usize,
}

impl ExtractCounts {
    fn print(&self) {
        println!(
            "Saved {} documents, {} spec records ({} flagged low yield).",
            self.documents, self.records, self.low_yield,
        );
    }
}

fn extract_documents(
    conn: &rusqlite::Connection,
    docs: &[sheets::RawDocument],
) -> anyhow::Result<ExtractCounts> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let rules = parser::rules::RuleSet::standard();

    let pb = ProgressBar::new(docs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
            .unwrap()
            .progress_chars("#>-"),
    );

    let mut counts = ExtractCounts {
        documents: 0,
        records: 0,
        low_yield: 0,
    };

    for chunk in docs.chunks(500) {
        let results: Vec<_> = chunk
            .par_iter()
            .map(|doc| parser::process_document(doc, &rules))
            .collect();

        let mut rows = Vec::new();
        let mut records = Vec::new();
        for (doc, parsed) in chunk.iter().zip(results) {
            rows.push(db::DocumentRow {
                sku: parsed.sku.clone(),
                path: doc.path.display().to_string(),
                line_count: doc.lines.len() as i64,
                field_count: parsed.field_count as i64,
                low_yield: parsed.low_yield,
                status: (if parsed.records.is_empty() { "empty" } else { "ok" }).to_string(),
                error: None,
            });
            counts.low_yield += parsed.low_yield as usize;
            counts.records += parsed.records.len();
            records.extend(parsed.records);
        }
        counts.documents += rows.len();

        db::save_documents(conn, &rows)?;
        db::save_spec_records(conn, &records)?;
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    Ok(counts)
}

fn enrich_catalog(conn: &rusqlite::Connection, path: &std::path::Path) -> anyhow::Result<()> {
    let specs = db::fetch_spec_records(conn, None)?;
    let index = catalog::SpecIndex::build(&specs);
    println!(
        "Spec index: {} keys from {} records.",
        index.len(),
        specs.len()
    );

    let mut products = catalog::build_products(path, &index)?;
    let own = products.iter().filter(|p| p.pdf_specs.is_some()).count();

    // Parents are fixed before any child is touched.
    let parents = inherit::ParentIndex::build(&products);
    let propagated = inherit::propagate(&mut products, &parents);

    db::save_products(conn, &products)?;
    println!(
        "Saved {} products ({} with own specs, {} parents, {} inherited).",
        products.len(),
        own,
        parents.len(),
        propagated,
    );
    Ok(())
}

fn export_all(conn: &rusqlite::Connection, out: &std::path::Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(out)?;

    let mut language_counts = Vec::new();
    for lang in ["en", "fr", "de"] {
        let records = db::fetch_spec_records(conn, Some(lang))?;
        let path = out.join(format!("product_specs_{lang}.json"));
        std::fs::write(&path, serde_json::to_string_pretty(&records)?)?;
        println!("Wrote {} records to {}", records.len(), path.display());
        language_counts.push((lang, records.len()));
    }

    let products = db::fetch_products(conn)?;
    let products_path = out.join("products_enriched.json");
    std::fs::write(&products_path, serde_json::to_string_pretty(&products)?)?;
    println!("Wrote {} products to {}", products.len(), products_path.display());

    let manifest = serde_json::json!({
        "exported_at": chrono::Utc::now().to_rfc3339(),
        "products": products.len(),
        "spec_records": language_counts
            .iter()
            .map(|(lang, n)| (lang.to_string(), n))
            .collect::<std::collections::BTreeMap<_, _>>(),
    });
    std::fs::write(
        out.join("export_manifest.json"),
        serde_json::to_string_pretty(&manifest)?,
    )?;
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
