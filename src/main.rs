use chrono::{Local, Utc};
use clap::{Arg, ArgMatches, Command};
use log::LevelFilter;
use mail_briefing::config::loader::load_config_or_default;
use mail_briefing::rules::RuleEngine;
use mail_briefing::scheduling::{suggest_meeting_times, DEFAULT_SUGGESTIONS};
use mail_briefing::summary::build_provider;
use mail_briefing::text::truncate_chars;
use mail_briefing::{Assistant, ClassifiedEmail, Config, JsonMailbox, Summary};
use serde::Serialize;
use std::process;
use std::str::FromStr;

#[tokio::main]
async fn main() {
    let matches = Command::new("mail-briefing")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Prioritize recent email, extract tasks and summarize the inbox")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("mail-briefing.yaml"),
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
                .help("Validate the configuration and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("emails")
                .short('e')
                .long("emails")
                .value_name("FILE")
                .help("JSON file with exported messages")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print results as JSON")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("summary")
                .long("summary")
                .value_name("ID")
                .help("Summarize one email")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("regenerate")
                .long("regenerate")
                .help("Ignore cached summaries for --summary or --briefing")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("briefing")
                .long("briefing")
                .help("Summarize the whole inbox")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("stats")
                .long("stats")
                .help("Show inbox statistics")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("tasks")
                .long("tasks")
                .value_name("ID")
                .help("List tasks found in one email")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("explain")
                .long("explain")
                .value_name("ID")
                .help("Show how one email's priority score was computed")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("suggest-times")
                .long("suggest-times")
                .help("Suggest meeting slots on the next business days")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("health")
                .long("health")
                .help("Show provider and cache status")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("mail-briefing.yaml");

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        configured_level(config_path).unwrap_or(LevelFilter::Info)
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    let config = match load_config_or_default(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e:#}");
            process::exit(1);
        }
    };

    if matches.get_flag("test-config") {
        test_config(&config);
        return;
    }

    if matches.get_flag("suggest-times") {
        print_meeting_times(matches.get_flag("json"));
        return;
    }

    let assistant = match Assistant::from_config(&config) {
        Ok(assistant) => assistant,
        Err(e) => {
            eprintln!("❌ Failed to initialize: {e:#}");
            process::exit(1);
        }
    };

    if let Some(path) = matches.get_one::<String>("emails") {
        let mailbox = JsonMailbox::new(path, config.mailbox.clone());
        if let Err(e) = assistant.refresh(&mailbox, Utc::now()) {
            eprintln!("❌ Failed to load emails: {e:#}");
            process::exit(1);
        }
    } else if !matches.get_flag("health") {
        eprintln!("No emails loaded; pass --emails FILE");
        process::exit(1);
    }

    run(&assistant, &matches).await;
}

async fn run(assistant: &Assistant, matches: &ArgMatches) {
    let json = matches.get_flag("json");
    let regenerate = matches.get_flag("regenerate");

    if matches.get_flag("health") {
        let health = assistant.health();
        if json {
            print_json(&health);
        } else {
            println!("🩺 Health");
            println!("═══════════════════════════════════════");
            match &health.provider {
                Some(name) => println!("  Provider: {name}"),
                None => println!("  Provider: not configured (fallback summaries)"),
            }
            println!("  Classified emails: {}", health.classified_emails);
            println!(
                "  Cached summaries: {}/{}",
                health.cached_summaries, health.cache_capacity
            );
        }
        return;
    }

    if let Some(id) = matches.get_one::<String>("tasks") {
        match assistant.tasks_for(id) {
            Ok(tasks) if json => print_json(&tasks),
            Ok(tasks) if tasks.is_empty() => println!("No tasks found in {id}"),
            Ok(tasks) => {
                println!("📅 Tasks in {id}:");
                for task in tasks {
                    match task.time_hint {
                        Some(hint) => println!("  • {} [{}]", task.description, hint),
                        None => println!("  • {}", task.description),
                    }
                }
            }
            Err(e) => {
                eprintln!("❌ {e}");
                process::exit(1);
            }
        }
        return;
    }

    if let Some(id) = matches.get_one::<String>("explain") {
        match assistant.explain(id) {
            Ok(breakdown) if json => print_json(&breakdown),
            Ok(Some(breakdown)) => {
                println!("🔍 Priority for {id}:");
                println!("  {}", breakdown.evidence());
            }
            Ok(None) => println!("{id} is blank; neutral classification"),
            Err(e) => {
                eprintln!("❌ {e}");
                process::exit(1);
            }
        }
        return;
    }

    if let Some(id) = matches.get_one::<String>("summary") {
        let result = if regenerate {
            assistant.regenerate_summary(id).await
        } else {
            assistant.email_summary(id).await
        };
        match result {
            Ok(summary) if json => print_json(&summary),
            Ok(summary) => print_summary(&summary),
            Err(e) => {
                eprintln!("❌ {e}");
                process::exit(1);
            }
        }
        return;
    }

    if matches.get_flag("briefing") {
        let result = if regenerate {
            assistant.regenerate_briefing().await
        } else {
            assistant.briefing().await
        };
        match result {
            Ok(briefing) if json => print_json(&briefing),
            Ok(briefing) => {
                print_summary(&briefing.summary);
                println!();
                print_stats(&briefing.stats);
            }
            Err(e) => {
                eprintln!("❌ {e}");
                process::exit(1);
            }
        }
        return;
    }

    if matches.get_flag("stats") {
        let stats = assistant.statistics();
        if json {
            print_json(&stats);
        } else {
            print_stats(&stats);
        }
        return;
    }

    let emails = assistant.emails();
    if json {
        print_json(&emails);
    } else {
        print_table(&emails);
    }
}

fn configured_level(path: &str) -> Option<LevelFilter> {
    if !std::path::Path::new(path).exists() {
        return None;
    }
    let config = Config::from_file(path).ok()?;
    LevelFilter::from_str(&config.logging?.level).ok()
}

fn generate_default_config(path: &str) {
    let config = Config::default();
    match config.to_file(path) {
        Ok(()) => {
            println!("Default configuration written to: {path}");
            println!("Please edit the configuration file to suit your needs.");
        }
        Err(e) => {
            eprintln!("Error writing configuration file: {e:#}");
            process::exit(1);
        }
    }
}

fn test_config(config: &Config) {
    println!("🔍 Testing configuration...");
    println!();

    if let Err(e) = config.validate() {
        println!("❌ Configuration validation failed:");
        println!("Error: {e:#}");
        process::exit(1);
    }
    if let Err(e) = RuleEngine::new(&config.classification) {
        println!("❌ Classification patterns failed to compile:");
        println!("Error: {e:#}");
        process::exit(1);
    }

    let weights = &config.classification.weights;
    println!("Important senders: {}", config.classification.important_senders.len());
    println!(
        "Priority weights: base {:.2}, density {:.2}, tasks {:.2}, importance {:.2}",
        weights.base, weights.keyword_density, weights.task_bonus, weights.importance_bonus
    );
    println!(
        "Highest score without tasks: {:.2}",
        weights.ceiling_without_tasks()
    );
    match build_provider(&config.provider) {
        Some(provider) => println!("Summary provider: {}", provider.name()),
        None => println!("Summary provider: none (fallback summaries only)"),
    }
    println!("✅ Configuration is valid");
}

fn print_meeting_times(json: bool) {
    let slots = suggest_meeting_times(Local::now().naive_local(), DEFAULT_SUGGESTIONS);
    if json {
        print_json(&slots);
        return;
    }
    println!("📅 Suggested meeting times:");
    for slot in slots {
        println!("  • {}", slot.format("%a %Y-%m-%d %H:%M"));
    }
}

fn print_table(emails: &[ClassifiedEmail]) {
    println!("📬 {} emails", emails.len());
    println!("═══════════════════════════════════════");
    println!(
        "{:<12} {:>5} {:<6} {:<5} {:<4} {:<20} {:<36} Labels",
        "ID", "Score", "Band", "Tasks", "Imp", "From", "Subject"
    );
    for email in emails {
        let c = &email.classification;
        let labels: Vec<&str> = c.labels.iter().map(String::as_str).collect();
        println!(
            "{:<12} {:>5.2} {:<6} {:<5} {:<4} {:<20} {:<36} {}",
            truncate_chars(email.id(), 12),
            c.priority_score,
            c.band().as_str(),
            if c.has_tasks { "yes" } else { "" },
            if c.is_important { "!" } else { "" },
            truncate_chars(&email.email.sender_name(), 20),
            truncate_chars(email.email.subject.trim(), 36),
            labels.join(",")
        );
    }
}

fn print_summary(summary: &Summary) {
    let source = if summary.generated_with_ai {
        "AI summary".to_string()
    } else {
        match &summary.fallback_reason {
            Some(reason) => format!("basic summary, {reason}"),
            None => "basic summary".to_string(),
        }
    };
    let cached = if summary.from_cache { ", cached" } else { "" };
    println!(
        "📝 {} ({}, {} words{})",
        summary.identifier,
        source,
        summary.word_count(),
        cached
    );
    println!("═══════════════════════════════════════");
    println!("{}", summary.text);
}

fn print_stats(stats: &mail_briefing::InboxStats) {
    println!("📊 Inbox Statistics");
    println!("═══════════════════════════════════════");
    println!("  Total: {}", stats.total);
    println!("  ├─ High priority: {}", stats.high_priority);
    println!("  ├─ With tasks: {}", stats.with_tasks);
    println!("  └─ Important: {}", stats.important);
    if !stats.top_labels.is_empty() {
        println!();
        println!("  Top labels:");
        for label in &stats.top_labels {
            println!("    {:<12} {}", label.label, label.count);
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("❌ Failed to serialize output: {e}");
            process::exit(1);
        }
    }
}
