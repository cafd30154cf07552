mod config;
mod debounce;
mod head;
mod logging;
mod meta;
mod models;
mod page;
mod slug;
mod structured_data;
mod validate;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use config::SiteConfig;
use debounce::{Debouncer, SuggestField, Suggester};
use head::Head;
use models::{find_job, JobRecord};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use structured_data::{
    breadcrumb_trail, build_breadcrumb_list, build_job_posting, build_job_posting_list,
    build_job_postings, job_posting_marker, BREADCRUMB_MARKER, JOB_LIST_MARKER,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use validate::{validate_job_posting, ValidationReport};

#[derive(Parser)]
#[command(name = "aidboard")]
#[command(about = "Job slugs, structured data and SEO metadata for a humanitarian job board")]
struct Cli {
    /// Canonical site origin (overrides config file and AIDBOARD_SITE_ORIGIN)
    #[arg(long, global = true)]
    origin: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the slug for a job title and id
    Slug {
        /// Job title
        title: String,

        /// Job ID
        id: u64,
    },

    /// Extract the job id from a slug or job path
    Decode {
        /// Slug, e.g. senior-program-officer-7
        slug: String,
    },

    /// List jobs with their canonical paths
    Jobs {
        /// Jobs file (JSON array or JSON lines)
        file: PathBuf,
    },

    /// Print JobPosting JSON-LD
    Jsonld {
        /// Jobs file (JSON array or JSON lines)
        file: PathBuf,

        /// Job ID, slug or path; all jobs when omitted
        #[arg(short, long)]
        job: Option<String>,

        /// Print an ItemList summary instead of full postings
        #[arg(long)]
        list: bool,
    },

    /// Show the breadcrumb trail for a page
    Breadcrumbs {
        /// Job title
        title: String,

        /// Sector filter crumb
        #[arg(short, long)]
        sector: Option<String>,

        /// Include the current job as the last crumb
        #[arg(long)]
        detail: bool,

        /// Print BreadcrumbList JSON-LD
        #[arg(long)]
        json: bool,
    },

    /// Validate JobPosting structured data from a JSON file
    Validate {
        /// JSON file holding one object or an array of objects
        file: PathBuf,
    },

    /// Validate the JobPosting JSON-LD embedded in an HTML page
    Inspect {
        /// HTML file
        file: PathBuf,
    },

    /// Show page title, meta description and canonical URL
    Meta {
        /// Jobs file (JSON array or JSON lines)
        file: PathBuf,

        /// Job ID, slug or path
        job: String,
    },

    /// Render the Open Graph preview card as SVG
    OgImage {
        /// Jobs file (JSON array or JSON lines)
        file: PathBuf,

        /// Job ID, slug or path
        job: String,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render the JSON-LD head fragment for a job page or the listing page
    Head {
        /// Jobs file (JSON array or JSON lines)
        file: PathBuf,

        /// Job ID, slug or path; the listing page when omitted
        #[arg(short, long)]
        job: Option<String>,
    },

    /// Autocomplete queries read from stdin, one per keystroke line
    Suggest {
        /// Jobs file (JSON array or JSON lines)
        file: PathBuf,

        /// Field to complete
        #[arg(short, long, value_enum, default_value = "organization")]
        field: SuggestField,

        /// Maximum suggestions per query
        #[arg(short, long, default_value = "8")]
        limit: usize,

        /// Quiet period before a lookup fires
        #[arg(long, default_value = "300")]
        delay_ms: u64,
    },
}

/// Accepts a numeric id, a slug, or a `/jobs/<slug>` path.
fn resolve_job_ref(reference: &str) -> Option<u64> {
    let reference = reference.trim().trim_end_matches('/');
    if let Ok(id) = reference.parse::<u64>() {
        return Some(id);
    }
    let segment = reference.rsplit('/').next().unwrap_or(reference);
    slug::extract_job_id_from_slug(segment)
}

fn lookup_job<'a>(records: &'a [JobRecord], reference: &str) -> Result<&'a JobRecord> {
    let id = resolve_job_ref(reference)
        .ok_or_else(|| anyhow!("No job id in '{}' (not found)", reference))?;
    find_job(records, id)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_wrapped(prefix: &str, message: &str) {
    let indent = " ".repeat(prefix.len() + 2);
    let options = textwrap::Options::new(88)
        .initial_indent("")
        .subsequent_indent(&indent);
    println!("  {}{}", prefix, textwrap::fill(message, options));
}

fn print_report(label: &str, report: &ValidationReport) {
    println!("{}: {}", label, if report.valid { "VALID" } else { "INVALID" });
    for error in &report.errors {
        print_wrapped("error: ", error);
    }
    for warning in &report.warnings {
        print_wrapped("warning: ", warning);
    }
    for recommendation in &report.recommendations {
        print_wrapped("tip: ", recommendation);
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn render_head(records: &[JobRecord], job: Option<&JobRecord>, config: &SiteConfig) -> Result<String> {
    let mut head = Head::new();
    let mut scope = head.scope();
    match job {
        Some(job) => {
            scope.attach(&job_posting_marker(job.id), &build_job_posting(job, config))?;
            let trail = breadcrumb_trail(&job.title, job.sector.as_deref(), true);
            scope.attach(BREADCRUMB_MARKER, &build_breadcrumb_list(&trail, config))?;
        }
        None => {
            scope.attach(JOB_LIST_MARKER, &build_job_posting_list(records, config))?;
            let trail = breadcrumb_trail("", None, false);
            scope.attach(BREADCRUMB_MARKER, &build_breadcrumb_list(&trail, config))?;
        }
    }
    debug!(elements = scope.head().len(), "rendered head");
    Ok(scope.head().render())
}

fn run_suggest(records: &[JobRecord], field: SuggestField, limit: usize, delay: Duration) -> Result<()> {
    let suggester = Arc::new(Suggester::from_records(records, field));
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;

    runtime.block_on(async move {
        let mut debouncer = Debouncer::new(delay);
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        while let Some(query) = lines.next_line().await.context("Failed to read query")? {
            let suggester = Arc::clone(&suggester);
            debouncer.call(async move {
                let matches = suggester.suggest(&query, limit);
                if matches.is_empty() {
                    println!("{}: no matches", query.trim());
                } else {
                    println!("{}: {}", query.trim(), matches.join(", "));
                }
            });
        }

        if debouncer.is_pending() {
            debug!("input closed, waiting for the last lookup");
        }
        debouncer.flush().await;
        Ok::<(), anyhow::Error>(())
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut config = SiteConfig::load()?;
    if let Some(origin) = cli.origin {
        config = config.with_origin(origin);
    }
    debug!(origin = config.origin(), site = %config.site_name, "site config");

    match cli.command {
        Commands::Slug { title, id } => {
            println!("{}", slug::generate_job_slug(&title, id));
        }

        Commands::Decode { slug: reference } => match resolve_job_ref(&reference) {
            Some(id) => println!("{}", id),
            None => return Err(anyhow!("No job id in '{}' (not found)", reference)),
        },

        Commands::Jobs { file } => {
            let records = JobRecord::load_all(&file)?;
            if records.is_empty() {
                println!("No jobs found.");
            } else {
                println!("{:<8} {:<30} {:<24} {:<40}", "ID", "TITLE", "ORGANIZATION", "PATH");
                println!("{}", "-".repeat(105));
                for job in &records {
                    println!(
                        "{:<8} {:<30} {:<24} {:<40}",
                        job.id,
                        meta::truncate(&job.title, 28),
                        meta::truncate(&job.organization, 22),
                        slug::job_path(&job.title, job.id)
                    );
                }
            }
        }

        Commands::Jsonld { file, job, list } => {
            let records = JobRecord::load_all(&file)?;
            match (job, list) {
                (Some(reference), _) => {
                    let job = lookup_job(&records, &reference)?;
                    print_json(&build_job_posting(job, &config))?;
                }
                (None, true) => print_json(&build_job_posting_list(&records, &config))?,
                (None, false) => print_json(&build_job_postings(&records, &config))?,
            }
        }

        Commands::Breadcrumbs {
            title,
            sector,
            detail,
            json,
        } => {
            let trail = breadcrumb_trail(&title, sector.as_deref(), detail);
            if json {
                print_json(&build_breadcrumb_list(&trail, &config))?;
            } else {
                for item in &trail {
                    match (&item.path, item.current) {
                        (_, true) => println!("{} (current)", item.label),
                        (Some(path), false) => println!("{} -> {}", item.label, path),
                        (None, false) => println!("{}", item.label),
                    }
                }
            }
        }

        Commands::Validate { file } => {
            let postings = match read_json(&file)? {
                Value::Array(items) => items,
                other => vec![other],
            };

            let mut failed = 0;
            for (i, posting) in postings.iter().enumerate() {
                let report = validate_job_posting(posting);
                let title = posting.get("title").and_then(Value::as_str).unwrap_or("untitled");
                print_report(&format!("#{} {}", i + 1, meta::truncate(title, 60)), &report);
                if !report.valid {
                    failed += 1;
                }
            }

            if failed > 0 {
                return Err(anyhow!("{} of {} postings failed validation", failed, postings.len()));
            }
        }

        Commands::Inspect { file } => {
            let html = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let report = page::inspect_page(&html)?;

            println!("JSON-LD blocks: {}", report.blocks);
            for error in &report.parse_errors {
                print_wrapped("unparseable: ", error);
            }
            if report.postings.is_empty() {
                println!("No JobPosting found.");
            }
            for posting in &report.postings {
                let title = posting.title.as_deref().unwrap_or("untitled");
                print_report(&meta::truncate(title, 60), &posting.report);
            }

            if !report.all_valid() {
                return Err(anyhow!("Page structured data has problems"));
            }
        }

        Commands::Meta { file, job } => {
            let records = JobRecord::load_all(&file)?;
            let job = lookup_job(&records, &job)?;
            println!("Title: {}", meta::page_title(job, &config.site_name));
            println!("Description: {}", meta::meta_description(job));
            println!(
                "Canonical: {}",
                config.absolute_url(&slug::job_path(&job.title, job.id))
            );
            if let Some(source) = &job.source {
                println!("Source: {}", source);
            }
        }

        Commands::OgImage { file, job, output } => {
            let records = JobRecord::load_all(&file)?;
            let job = lookup_job(&records, &job)?;
            let svg = meta::og_image_svg(job, &config.site_name);

            if let Some(out_path) = output {
                std::fs::write(&out_path, &svg)
                    .with_context(|| format!("Failed to write to {}", out_path.display()))?;
                info!(path = %out_path.display(), job = job.id, "wrote OG image");
            } else {
                print!("{}", svg);
            }
        }

        Commands::Head { file, job } => {
            let records = JobRecord::load_all(&file)?;
            let job = job
                .as_deref()
                .map(|reference| lookup_job(&records, reference))
                .transpose()?;
            print!("{}", render_head(&records, job, &config)?);
        }

        Commands::Suggest {
            file,
            field,
            limit,
            delay_ms,
        } => {
            let records = JobRecord::load_all(&file)?;
            info!(jobs = records.len(), "reading queries from stdin");
            run_suggest(&records, field, limit, Duration::from_millis(delay_ms))?;
        }
    }

    Ok(())
}
