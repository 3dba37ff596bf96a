use anyhow::{Context, bail};
use calscrape_core::batch::BatchOptions;
use calscrape_core::config::AppConfig;
use calscrape_core::courses::run_course_batch;
use calscrape_core::programs::run_program_batch;
use calscrape_core::report::{BatchSummary, generate_text_summary};
use calscrape_core::requirements::run_requirement_batch;
use calscrape_core::vitals::run_vitals_batch;
use calscrape_core::Oracle;
use calscrape_scanner::PageExtractor;
use clap::ArgMatches;
use colored::Colorize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use url::Url;

pub const DEFAULT_CONFIG_PATH: &str = "~/.config/calscrape/config.json";

// Helper functions for batch handlers

/// Load URLs from either a file or a single URL argument
pub fn load_urls_from_source(
    url: Option<&Url>,
    urls_file: Option<&PathBuf>,
) -> Result<Vec<String>, String> {
    if let Some(urls_file_path) = urls_file {
        load_urls_from_file(urls_file_path)
    } else if let Some(url) = url {
        Ok(vec![url.as_str().to_string()])
    } else {
        Err("Either --url or --urls-file must be provided".to_string())
    }
}

/// Load and parse URLs from a file
pub fn load_urls_from_file(path: &PathBuf) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read URLs file {}: {}", path.display(), e))?;

    let urls: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(parse_url_line)
        .collect();

    if urls.is_empty() {
        return Err(format!("No valid URLs found in {}", path.display()));
    }

    Ok(urls)
}

/// Parse a single line as a URL, trying to add http:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    if Url::parse(line).is_ok() {
        return Some(line.to_string());
    }

    let with_scheme = format!("http://{}", line);
    if !line.contains(char::is_whitespace) && Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    eprintln!("{} Skipping invalid URL '{}'", "⚠".yellow().bold(), line);
    None
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from(shellexpand::tilde(DEFAULT_CONFIG_PATH).as_ref())
}

/// An explicit `--config` must exist; the default location is optional.
pub fn resolve_config(explicit: Option<&PathBuf>) -> anyhow::Result<AppConfig> {
    match explicit {
        Some(path) => {
            let path = expand(path);
            AppConfig::load(&path).with_context(|| format!("Could not load config {}", path.display()))
        }
        None => Ok(AppConfig::load_or_default(&default_config_path())?),
    }
}

fn expand(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref())
}

/// Batch options from config, with `--threads` and `--delay-ms` on top.
pub fn batch_options(config: &AppConfig, sub_matches: &ArgMatches, quiet: bool) -> BatchOptions {
    BatchOptions::from_config(config)
        .with_workers(sub_matches.get_one::<usize>("threads").copied())
        .with_delay_ms(sub_matches.get_one::<u64>("delay-ms").copied())
        .quiet(quiet)
}

pub fn print_banner() {
    println!(
        "{} {}",
        "calscrape".bright_cyan().bold(),
        env!("CARGO_PKG_VERSION").bright_black()
    );
    println!();
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_prompt(msg: &str) -> io::Result<String> {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim().to_lowercase())
}

fn print_summary(title: &str, summary: &BatchSummary, quiet: bool) {
    if quiet {
        return;
    }
    println!();
    print!("{}", generate_text_summary(title, summary));
    if summary.pages_failed > 0 {
        println!(
            "{} {} page(s) could not be fetched, see the warnings above",
            "⚠".yellow().bold(),
            summary.pages_failed
        );
    }
}

pub fn handle_init(args: &ArgMatches) -> anyhow::Result<()> {
    print_divider();
    println!("{}", "  CALSCRAPE INITIALIZATION".bright_white().bold());
    print_divider();
    println!();

    let config_path = args
        .get_one::<String>("PATH")
        .map(|path| PathBuf::from(shellexpand::tilde(path).as_ref()))
        .unwrap_or_else(default_config_path);
    let force = args.get_flag("force");

    println!(
        "{} Target: {}",
        "→".blue(),
        config_path.display().to_string().bright_white()
    );
    println!();

    if config_path.exists() && !force {
        println!("{}", "⚠ WARNING".yellow().bold());
        println!("A config file already exists:");
        println!(
            "  {} {}",
            "•".yellow(),
            config_path.display().to_string().bright_white()
        );
        println!();

        let response = print_prompt("Overwrite it with the defaults? [y/N]:")?;
        println!();

        if response != "y" && response != "yes" {
            println!("{} Initialization cancelled.", "✗".red().bold());
            return Ok(());
        }
        println!("{} Proceeding with overwrite", "→".yellow().bold());
    }

    AppConfig::default().save(&config_path)?;

    println!(
        "{} Config written: {}",
        "✓".green().bold(),
        config_path.display().to_string().bright_white()
    );
    println!();
    Ok(())
}

pub async fn handle_programs(sub_matches: &ArgMatches, quiet: bool) -> anyhow::Result<()> {
    let config = resolve_config(sub_matches.get_one::<PathBuf>("config"))?;
    let urls = load_urls_from_source(
        sub_matches.get_one::<Url>("url"),
        sub_matches.get_one::<PathBuf>("urls-file"),
    )
    .map_err(anyhow::Error::msg)?;
    let output = required_path(sub_matches, "output")?;
    let options = batch_options(&config, sub_matches, quiet);

    if !quiet {
        println!("Scraping {} program page(s) with {} workers\n", urls.len(), options.workers);
    }
    info!("Program batch: {} urls -> {}", urls.len(), output.display());

    let summary = run_program_batch(&config, &options, urls, &output).await?;
    print_summary("Program scrape", &summary, quiet);
    Ok(())
}

pub async fn handle_vitals(sub_matches: &ArgMatches, quiet: bool) -> anyhow::Result<()> {
    let config = resolve_config(sub_matches.get_one::<PathBuf>("config"))?;
    let urls = load_urls_from_source(
        sub_matches.get_one::<Url>("url"),
        sub_matches.get_one::<PathBuf>("urls-file"),
    )
    .map_err(anyhow::Error::msg)?;
    let output = required_path(sub_matches, "output")?;
    let options = batch_options(&config, sub_matches, quiet);

    if !quiet {
        println!("Reading vitals of {} program page(s) with {} workers\n", urls.len(), options.workers);
    }

    let summary = run_vitals_batch(&config, &options, urls, &output).await?;
    print_summary("Program vitals", &summary, quiet);
    Ok(())
}

pub async fn handle_courses(sub_matches: &ArgMatches, quiet: bool) -> anyhow::Result<()> {
    let config = resolve_config(sub_matches.get_one::<PathBuf>("config"))?;
    let urls = load_urls_from_source(
        sub_matches.get_one::<Url>("url"),
        sub_matches.get_one::<PathBuf>("urls-file"),
    )
    .map_err(anyhow::Error::msg)?;
    let output = required_path(sub_matches, "output")?;
    let options = batch_options(&config, sub_matches, quiet);

    if !quiet {
        println!("Scraping {} subject page(s) with {} workers\n", urls.len(), options.workers);
    }

    let summary = run_course_batch(&config, &options, urls, &output).await?;
    print_summary("Course scrape", &summary, quiet);
    Ok(())
}

pub async fn handle_requirements(sub_matches: &ArgMatches, quiet: bool) -> anyhow::Result<()> {
    let config = resolve_config(sub_matches.get_one::<PathBuf>("config"))?;
    let input = required_path(sub_matches, "input")?;
    let output = required_path(sub_matches, "output")?;
    let options = batch_options(&config, sub_matches, quiet);

    let oracle = if sub_matches.get_flag("ai") || config.oracle.enabled {
        Some(Oracle::from_config(&config.oracle).context("Oracle is enabled but not usable")?)
    } else {
        None
    };

    if !quiet {
        println!(
            "Scraping requirements for {} (oracle: {})\n",
            input.display(),
            if oracle.is_some() { "on" } else { "off" }
        );
    }

    let summary = run_requirement_batch(&config, &options, &input, &output, oracle.as_ref()).await?;
    print_summary("Requirement scrape", &summary, quiet);
    Ok(())
}

pub fn handle_extract(sub_matches: &ArgMatches) -> anyhow::Result<()> {
    let config = resolve_config(sub_matches.get_one::<PathBuf>("config"))?;
    let file = required_path(sub_matches, "FILE")?;
    let url = sub_matches
        .get_one::<Url>("url")
        .context("--url is required")?
        .to_string();

    let html = fs::read_to_string(&file).with_context(|| format!("Failed to read {}", file.display()))?;
    let extractor = PageExtractor::new(config.extract)?;

    let json = if sub_matches.get_flag("courses") {
        serde_json::to_string_pretty(&extractor.extract_courses_from_html(&html))?
    } else if let Some(name) = sub_matches.get_one::<String>("name") {
        let found = extractor
            .extract_named_sections_from_html(&html, &url, &[name.as_str()])
            .pop()
            .context("no section returned")?;
        match found.matched_heading {
            Some(ref heading) => eprintln!("{} Matched heading: {}", "✓".green().bold(), heading),
            None => eprintln!("{} No heading matches '{}'", "⚠".yellow().bold(), name),
        }
        serde_json::to_string_pretty(&found.record)?
    } else {
        serde_json::to_string_pretty(&extractor.extract_sections_from_html(&html, &url))?
    };

    println!("{json}");
    Ok(())
}

fn required_path(sub_matches: &ArgMatches, id: &str) -> anyhow::Result<PathBuf> {
    match sub_matches.get_one::<PathBuf>(id) {
        Some(path) => Ok(expand(path)),
        None => bail!("--{id} is required"),
    }
}
