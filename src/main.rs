use clap::{Parser, Subcommand};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use doctidy::audit::generate_audit_report;
use doctidy::duplicates::find_duplicates;
use doctidy::logging::init_logger;
use doctidy::migrate::consolidate_duplicates;
use doctidy::quality::generate_quality_report;
use doctidy::rewrite::generate_redirects;
use doctidy::scanner::scan_directory;
use doctidy::similarity::similarity;
use doctidy::{Category, Config, Inventory, MigrationMapping, MigrationPlanner, MigrationSession};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// doctidy - Sort markdown docs into tutorials, how-tos, reference and explanation
#[derive(Parser)]
#[command(name = "doctidy")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true, default_value = ".doctidy.toml")]
    config: PathBuf,

    /// Quiet mode - only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log debug detail to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List documentation files by category
    Scan {
        /// Directory to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report duplicates, topic gaps and recommendations
    Audit {
        /// Directory to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Similarity threshold (0.0 to 1.0), overrides the config file
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the prioritized migration plan
    Plan {
        /// Directory to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Target documentation root, overrides the config file
        #[arg(short, long)]
        target: Option<PathBuf>,

        /// Maximum entries to show
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Copy files into the target layout and rewrite their links
    Migrate {
        /// Directory to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Target documentation root, overrides the config file
        #[arg(short, long)]
        target: Option<PathBuf>,

        /// Report what would happen without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Skip the backup of an existing target root
        #[arg(long)]
        no_backup: bool,

        /// Copy content verbatim instead of adding category sections
        #[arg(long)]
        no_adapt: bool,

        /// Write the migration report as JSON to this file
        #[arg(long)]
        report: Option<PathBuf>,

        /// Write old-to-new redirects as JSON to this file
        #[arg(long)]
        redirects: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Keep the newest file of every duplicate set and archive the rest
    Consolidate {
        /// Directory to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Similarity threshold (0.0 to 1.0), overrides the config file
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Archive root, overrides the config file
        #[arg(short, long)]
        archive: Option<PathBuf>,

        /// Show the sets without archiving anything
        #[arg(long)]
        dry_run: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Score documentation quality
    Validate {
        /// Directory to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Fail when the overall score is below this value
        #[arg(long)]
        min_score: Option<u32>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Content similarity of two files
    Similarity {
        /// First file
        file1: PathBuf,

        /// Second file
        file2: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose, cli.quiet);

    let result = Config::load(&cli.config).map_err(Into::into).and_then(|config| match cli.command {
        Commands::Scan { path, json } => cmd_scan(&path, &config, json),
        Commands::Audit { path, threshold, json } => {
            cmd_audit(&path, &config, threshold.unwrap_or(config.duplicate_threshold), json)
        }
        Commands::Plan { path, target, limit, json } => {
            cmd_plan(&path, &config, target.as_deref(), limit, json)
        }
        Commands::Migrate { path, target, dry_run, no_backup, no_adapt, report, redirects, json } => {
            let options = MigrateOptions {
                dry_run,
                backup: !no_backup,
                adapt: !no_adapt,
                report,
                redirects,
                json,
            };
            cmd_migrate(&path, &config, target.as_deref(), &options)
        }
        Commands::Consolidate { path, threshold, archive, dry_run, json } => cmd_consolidate(
            &path,
            &config,
            threshold.unwrap_or(config.duplicate_threshold),
            archive.as_deref().unwrap_or(config.archive_root.as_path()),
            dry_run,
            json,
        ),
        Commands::Validate { path, min_score, json } => cmd_validate(&path, &config, min_score, json),
        Commands::Similarity { file1, file2, json } => cmd_similarity(&file1, &file2, json),
    });

    if let Err(e) = result {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn load_inventory(path: &Path, config: &Config) -> Result<Inventory, Box<dyn std::error::Error>> {
    Ok(Inventory::new(scan_directory(path, config)?))
}

fn category_label(category: Category) -> ColoredString {
    match category {
        Category::Tutorial => category.as_str().green(),
        Category::HowTo => category.as_str().cyan(),
        Category::Reference => category.as_str().blue(),
        Category::Explanation => category.as_str().magenta(),
        Category::Project => category.as_str().yellow(),
        Category::Archive => category.as_str().dimmed(),
        Category::Uncategorized => category.as_str().red(),
    }
}

fn cmd_scan(path: &Path, config: &Config, json: bool) -> CmdResult {
    let start = Instant::now();
    let inventory = load_inventory(path, config)?;

    if json {
        let files: Vec<_> = inventory
            .iter()
            .map(|(file, category)| {
                serde_json::json!({
                    "path": file.path,
                    "rel_path": file.rel_path,
                    "size": file.size,
                    "category": category,
                })
            })
            .collect();
        let output = serde_json::json!({
            "total_files": inventory.len(),
            "total_size": inventory.total_size(),
            "by_category": inventory.counts(),
            "files": files,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{} {} files ({} bytes) in {:?}",
        "Scanned".cyan().bold(),
        inventory.len().to_string().yellow().bold(),
        inventory.total_size(),
        start.elapsed()
    );

    for category in Category::ALL {
        let files = inventory.in_category(category);
        if files.is_empty() {
            continue;
        }
        println!();
        println!("{} ({})", category_label(category).bold(), files.len());
        for file in files {
            println!("  {}", file.rel_path.display().to_string().dimmed());
        }
    }

    Ok(())
}

fn cmd_audit(path: &Path, config: &Config, threshold: f64, json: bool) -> CmdResult {
    let inventory = load_inventory(path, config)?;
    let report = generate_audit_report(&inventory, threshold);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "Documentation Audit".green().bold());
    println!();
    println!("  Total files:       {}", report.summary.total_files.to_string().cyan());
    println!("  Total size:        {}", report.summary.total_size.to_string().cyan());
    for (category, count) in &report.summary.by_category {
        println!("  {:<18} {}", format!("{category}:"), count);
    }

    println!();
    if report.duplicates.is_empty() {
        println!("{}", "No duplicates found above threshold.".green());
    } else {
        println!(
            "{} duplicate sets found (threshold: {}%)",
            report.duplicates.len().to_string().yellow().bold(),
            (threshold * 100.0) as u32
        );
        for (i, set) in report.duplicates.iter().enumerate() {
            println!();
            println!("  {} {:.0}% similar", format!("[{}]", i + 1).cyan(), set.similarity * 100.0);
            for file in &set.files {
                println!("    {}", file.rel_path.display());
            }
            println!("    {}", set.recommendation.dimmed());
        }
    }

    println!();
    println!(
        "{} missing topics ({} priority)",
        report.gaps.total().to_string().yellow().bold(),
        report.gaps.priority
    );
    let gap_lists = [
        ("tutorials", &report.gaps.missing_tutorials),
        ("how-to", &report.gaps.missing_how_tos),
        ("reference", &report.gaps.missing_reference),
        ("explanation", &report.gaps.missing_explanations),
    ];
    for (label, missing) in gap_lists {
        if !missing.is_empty() {
            println!("  {:<12} {}", label, missing.join(", ").dimmed());
        }
    }

    if !report.recommendations.is_empty() {
        println!();
        println!("{}", "Recommendations".green().bold());
        for rec in &report.recommendations {
            println!("  - {}", rec);
        }
    }

    Ok(())
}

/// Resolve the target root and plan every file that is not already in place.
fn build_plan(
    inventory: &Inventory,
    config: &Config,
    target: Option<&Path>,
) -> Result<Vec<MigrationMapping>, Box<dyn std::error::Error>> {
    let target_root = std::path::absolute(target.unwrap_or(config.target_root.as_path()))?;
    let planner = MigrationPlanner::new(target_root).with_recent_days(config.recent_days);

    Ok(planner.create_migration_mapping(inventory))
}

fn cmd_plan(path: &Path, config: &Config, target: Option<&Path>, limit: Option<usize>, json: bool) -> CmdResult {
    let inventory = load_inventory(path, config)?;
    let plan = build_plan(&inventory, config, target)?;
    let shown = limit.unwrap_or(plan.len());

    if json {
        println!("{}", serde_json::to_string_pretty(&plan[..shown.min(plan.len())])?);
        return Ok(());
    }

    println!("{} {} files to migrate", "Plan".cyan().bold(), plan.len().to_string().yellow().bold());
    println!();

    for mapping in plan.iter().take(shown) {
        println!(
            "  {:>2} {:<13} {:<6} {}",
            mapping.priority.to_string().yellow(),
            category_label(mapping.category),
            mapping.estimated_effort.as_str().dimmed(),
            mapping.old_path.display()
        );
        println!("     {} {}", "->".dimmed(), mapping.new_path.display().to_string().green());
    }

    if shown < plan.len() {
        println!();
        println!("  ... and {} more", plan.len() - shown);
    }

    Ok(())
}

struct MigrateOptions {
    dry_run: bool,
    backup: bool,
    adapt: bool,
    report: Option<PathBuf>,
    redirects: Option<PathBuf>,
    json: bool,
}

fn cmd_migrate(path: &Path, config: &Config, target: Option<&Path>, options: &MigrateOptions) -> CmdResult {
    let inventory = load_inventory(path, config)?;
    let plan = build_plan(&inventory, config, target)?;
    let target_root = std::path::absolute(target.unwrap_or(config.target_root.as_path()))?;

    let report = MigrationSession::new(&target_root)
        .dry_run(options.dry_run)
        .backup(options.backup)
        .adapt_content(options.adapt)
        .run(&plan)?;

    if let Some(report_path) = &options.report {
        report.write_json(report_path)?;
    }
    if let Some(redirects_path) = &options.redirects {
        fs::write(redirects_path, serde_json::to_string_pretty(&generate_redirects(&plan, true))?)?;
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let heading = if report.dry_run { "Dry run" } else { "Migrated" };
    println!(
        "{} {}/{} files into {}",
        heading.cyan().bold(),
        report.succeeded.to_string().green().bold(),
        report.total,
        target_root.display()
    );
    if let Some(backup) = &report.backup {
        println!("  Backup:         {}", backup.display().to_string().dimmed());
    }
    println!("  Links updated:  {}", report.links_updated.to_string().cyan());

    if report.failed > 0 {
        println!();
        println!("{} {} files failed", "Failed".red().bold(), report.failed);
        for error in &report.errors {
            println!("  - {}", error);
        }
    }

    Ok(())
}

fn cmd_consolidate(
    path: &Path,
    config: &Config,
    threshold: f64,
    archive_root: &Path,
    dry_run: bool,
    json: bool,
) -> CmdResult {
    let inventory = load_inventory(path, config)?;
    let sets = find_duplicates(inventory.files(), threshold);

    let mut outcomes = Vec::new();
    for set in &sets {
        let kept = if dry_run {
            set.most_recent().map(|f| f.path.clone()).unwrap_or_default()
        } else {
            consolidate_duplicates(&set.files, archive_root)?
        };
        let archived: Vec<&Path> = set
            .files
            .iter()
            .map(|f| f.path.as_path())
            .filter(|p| *p != kept)
            .collect();
        outcomes.push(serde_json::json!({
            "kept": kept,
            "archived": archived,
            "similarity": set.similarity,
        }));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
        return Ok(());
    }

    if sets.is_empty() {
        println!("{}", "No duplicates found above threshold.".green());
        return Ok(());
    }

    let verb = if dry_run { "Would keep" } else { "Kept" };
    for outcome in &outcomes {
        println!("{} {}", verb.cyan().bold(), outcome["kept"].as_str().unwrap_or_default());
        if let Some(archived) = outcome["archived"].as_array() {
            for file in archived {
                println!("  {} {}", "archive".dimmed(), file.as_str().unwrap_or_default());
            }
        }
    }

    Ok(())
}

fn score_color(score: u32) -> ColoredString {
    match score {
        s if s >= 80 => s.to_string().green().bold(),
        s if s >= 50 => s.to_string().yellow().bold(),
        s => s.to_string().red().bold(),
    }
}

fn cmd_validate(path: &Path, config: &Config, min_score: Option<u32>, json: bool) -> CmdResult {
    let inventory = load_inventory(path, config)?;
    let root = path.canonicalize()?;
    let report = generate_quality_report(&inventory, &root);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{} {}/100", "Quality score".green().bold(), score_color(report.overall_score));
        println!();
        println!("  Links:       {:.0}%", report.scores.links);
        println!("  Code:        {:.0}%", report.scores.code);
        println!("  Structure:   {:.0}%", report.scores.structure);
        println!("  Formatting:  {:.0}%", report.scores.formatting);
        println!("  Metadata:    {:.0}%", report.scores.metadata);

        if !report.links.broken.is_empty() {
            println!();
            println!("{}", "Broken links".red().bold());
            for link in &report.links.broken {
                println!(
                    "  {}:{}:{} {}",
                    link.file.display(),
                    link.line,
                    link.column,
                    link.url.yellow()
                );
            }
        }

        if !report.code.invalid.is_empty() {
            println!();
            println!("{}", "Invalid code examples".red().bold());
            for example in &report.code.invalid {
                println!("  {}:{} {}", example.file.display(), example.line, example.error.dimmed());
            }
        }

        if !report.recommendations.is_empty() {
            println!();
            println!("{}", "Recommendations".green().bold());
            for rec in &report.recommendations {
                println!("  - {}", rec);
            }
        }
    }

    match min_score {
        Some(min) if report.overall_score < min => {
            Err(format!("quality score {} is below the minimum of {}", report.overall_score, min).into())
        }
        _ => Ok(()),
    }
}

fn cmd_similarity(file1: &Path, file2: &Path, json: bool) -> CmdResult {
    let a = fs::read_to_string(file1)?;
    let b = fs::read_to_string(file2)?;
    let score = similarity(&a, &b);

    if json {
        let output = serde_json::json!({
            "file1": file1,
            "file2": file2,
            "similarity": score,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{} vs {}: {}",
        file1.display().to_string().cyan(),
        file2.display().to_string().cyan(),
        format!("{:.1}%", score * 100.0).yellow().bold()
    );

    Ok(())
}
