use clap::{Arg, ArgMatches, Command};
use log::LevelFilter;
use phish_score::report::{self, BatchReport};
use phish_score::rules::Rule;
use phish_score::server::{self, AppState};
use phish_score::{Config, DetectorError, PhishingScorer};
use std::path::PathBuf;
use std::process;

fn cli() -> Command {
    Command::new("phish-score")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Phishing Email Detector (rule-based scorer)")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("phish-score.yaml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Test configuration validity and print the rule table")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("FILE")
                .help("Input CSV path (overrides the configuration)"),
        )
        .arg(
            Arg::new("out")
                .short('o')
                .long("out")
                .value_name("FILE")
                .help("Output report CSV path (overrides the configuration)"),
        )
        .arg(
            Arg::new("min-score")
                .long("min-score")
                .alias("min_score")
                .value_name("N")
                .help("Only display emails with score >= this (negative shows all)")
                .allow_negative_numbers(true)
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("top")
                .long("top")
                .value_name("N")
                .help("Number of emails echoed to the terminal")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("serve")
                .long("serve")
                .help("Serve the interactive web view instead of writing a report")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("bind")
                .long("bind")
                .value_name("ADDR")
                .help("Web view bind address (overrides the configuration)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging with per-email scoring details")
                .action(clap::ArgAction::SetTrue),
        )
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("phish-score.yaml");

    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            process::exit(1);
        }
    };

    if matches.get_flag("test-config") {
        test_config(&config);
        return;
    }

    let scorer = PhishingScorer::new(config.rules.clone());

    if matches.get_flag("serve") {
        let state = AppState {
            scorer,
            input: matches
                .get_one::<String>("input")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(&config.server.input)),
            default_min_score: config.server.default_min_score,
        };
        let bind = matches
            .get_one::<String>("bind")
            .cloned()
            .unwrap_or_else(|| config.server.bind.clone());

        if let Err(e) = server::serve(state, &bind).await {
            log::error!("Web view error: {e:#}");
            process::exit(1);
        }
        return;
    }

    if let Err(e) = run_batch(&config, &scorer, &matches) {
        eprintln!("{e:#}");
        process::exit(1);
    }
}

fn load_config(path: &str) -> phish_score::error::Result<Config> {
    if std::path::Path::new(path).exists() {
        Config::from_file(path)
    } else {
        log::warn!("Configuration file '{path}' not found, using default configuration");
        Ok(Config::default())
    }
}

fn generate_default_config(path: &str) {
    match Config::default().to_file(path) {
        Ok(()) => {
            println!("Default configuration written to: {path}");
            println!("Please edit the configuration file to suit your needs.");
        }
        Err(e) => {
            eprintln!("Error writing configuration file: {e}");
            process::exit(1);
        }
    }
}

fn test_config(config: &Config) {
    let rules = &config.rules;

    println!("Configuration version: {}", config.version);
    println!("Keywords ({}): {}", rules.keywords.len(), rules.keywords.join(", "));
    println!(
        "Brands ({}, check: {:?}, match: {:?}):",
        rules.brands.len(),
        rules.brand_check,
        rules.brand_match
    );
    for brand in &rules.brands {
        println!("  {} -> [{}]", brand.name, brand.domains.join(", "));
    }
    println!("Risky extensions: {}", rules.risky_extensions.join(" "));
    println!();
    println!("Rules (evaluation order):");
    for rule in Rule::ALL {
        println!("  {:<24} +{}", rule.name(), rule.points(&rules.points));
    }
    println!("Configuration is valid.");
}

fn clamp_min_score(value: i64) -> u32 {
    value.clamp(0, u32::MAX as i64) as u32
}

fn run_batch(config: &Config, scorer: &PhishingScorer, matches: &ArgMatches) -> anyhow::Result<()> {
    let input = matches
        .get_one::<String>("input")
        .cloned()
        .unwrap_or_else(|| config.report.input.clone());
    let out = matches
        .get_one::<String>("out")
        .cloned()
        .unwrap_or_else(|| config.report.output.clone());
    let min_score = matches
        .get_one::<i64>("min-score")
        .map(|value| clamp_min_score(*value))
        .unwrap_or(config.report.min_score);
    let top = matches
        .get_one::<usize>("top")
        .copied()
        .unwrap_or(config.report.top);

    let batch = match BatchReport::from_csv_file(scorer, &input) {
        Ok(batch) => batch,
        Err(e @ DetectorError::SourceUnavailable(_)) => {
            println!("{e}");
            process::exit(1);
        }
        Err(e) => return Err(anyhow::Error::new(e).context(format!("Failed to load {input}"))),
    };

    let filtered = batch.at_least(min_score);

    println!("=== Phishing Email Detector ===");
    println!("Input: {input}");
    println!("Loaded: {} emails", batch.loaded());
    println!("Showing score >= {}: {} emails\n", min_score, filtered.len());

    if !batch.failures.is_empty() {
        println!("Rows with read problems ({}):", batch.failures.len());
        for failure in &batch.failures {
            println!("  - {failure}");
        }
        println!();
    }

    println!("Top suspicious emails:");
    for email in filtered.iter().take(top) {
        println!(
            "- id={} score={} sender={} subject={}",
            email.record.id, email.result.score, email.record.sender, email.record.subject
        );
        println!("  reasons: {}\n", email.result.reasons.join(";"));
    }

    report::write_report(&out, &batch.emails)
        .map_err(|e| anyhow::Error::new(e).context(format!("Failed to write {out}")))?;
    println!("Saved: {out}");
    Ok(())
}
