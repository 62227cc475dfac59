//! dars-audit - degree audit reader
//!
//! Parses a degree audit HTML export into requirements and, on request,
//! resolves each course against the course catalog.

use anyhow::{bail, Result};
use clap::Parser;
use dars_audit::{build_session, AuditDocument, RequirementCourses};
use dars_common::config::load_config;
use dars_common::models::partition_by_completion;
use dars_common::{CourseStatus, Error, Requirement};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dars-audit", version, about = "Read a degree audit and resolve its courses")]
struct Cli {
    /// Degree audit HTML file
    audit: PathBuf,

    /// Configuration file (overrides DARS_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Look up every course in the catalog
    #[arg(short, long)]
    resolve: bool,

    /// Only show the requirement with this id
    #[arg(long)]
    requirement: Option<usize>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct ResolvedRequirement<'a> {
    requirement: &'a Requirement,
    #[serde(flatten)]
    courses: RequirementCourses,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let loaded = load_config(cli.config.as_deref())?;
    let config = loaded.config;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        "Starting dars-audit v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    loaded.source.log();

    let document = AuditDocument::from_path(&cli.audit)?;
    let session = build_session(&config)?;
    let requirements = session.upload(document).await;

    let selected: Vec<&Requirement> = match cli.requirement {
        Some(id) => match requirements.iter().find(|r| r.id() == id) {
            Some(r) => vec![r],
            None => bail!("Audit has no requirement with id {}", id),
        },
        None => requirements.iter().collect(),
    };

    if !cli.resolve {
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&selected)?);
        } else {
            print_overview(&requirements, &selected);
        }
        return Ok(());
    }

    // Ctrl-C abandons in-flight lookups through the session
    let interrupt_session = session.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling course resolution");
            interrupt_session.reset().await;
        }
    });

    let mut resolved = Vec::with_capacity(selected.len());
    for requirement in selected {
        match session.resolve_requirement(requirement.id()).await {
            Ok(courses) => {
                if !cli.json {
                    print_requirement_courses(requirement, &courses);
                }
                resolved.push(ResolvedRequirement {
                    requirement,
                    courses,
                });
            }
            Err(Error::Cancelled(reason)) => {
                warn!(reason = %reason, "Course resolution cancelled");
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&resolved)?);
    }

    Ok(())
}

fn print_overview(all: &[Requirement], selected: &[&Requirement]) {
    if all.is_empty() {
        println!("No requirements found in audit.");
        return;
    }

    let (incomplete, complete) = partition_by_completion(all);
    let shown = |r: &&Requirement| selected.iter().any(|s| s.id() == r.id());

    for (heading, group) in [
        ("Incomplete Categories", incomplete),
        ("Completed Categories", complete),
    ] {
        println!("{}", heading);
        for requirement in group.into_iter().filter(shown) {
            let classes = requirement.classes();
            println!(
                "  [{}] {} ({} completed, {} in progress, {} needed)",
                requirement.id(),
                requirement.title(),
                classes.completed.len(),
                classes.in_progress.len(),
                classes.incompleted.len()
            );
        }
        println!();
    }
}

fn print_requirement_courses(requirement: &Requirement, view: &RequirementCourses) {
    println!("{}", requirement.title());

    for (heading, status) in [
        ("Need to Complete Courses:", CourseStatus::Incompleted),
        ("In Progress Courses:", CourseStatus::InProgress),
        ("Completed Courses:", CourseStatus::Completed),
    ] {
        let references = requirement.classes().bucket(status);
        if references.is_empty() && status == CourseStatus::InProgress {
            continue;
        }

        println!("  {}", heading);
        for reference in references {
            println!(
                "    {:<60} {}",
                view.display_label(reference),
                view.credits_label(reference)
            );
        }
        println!("    {:<60} {}", "Total Credits", view.totals.get(status));
    }
    println!();
}
