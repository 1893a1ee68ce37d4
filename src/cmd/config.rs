//! Configuration view and validation commands: `interviewer config`.

use anyhow::Result;

use interviewer::config::{InterviewerConfig, InterviewerToml};

use super::super::ConfigCommands;

fn print_sections(toml: &InterviewerToml) {
    println!("[assistant]");
    println!("  api_base = \"{}\"", toml.assistant.api_base);
    match &toml.assistant.assistant_id {
        Some(id) => println!("  assistant_id = \"{}\"", id),
        None => println!("  assistant_id = (unset)"),
    }
    println!("  api_key_env = \"{}\"", toml.assistant.api_key_env);
    println!(
        "  request_timeout_secs = {}",
        toml.assistant.request_timeout_secs
    );
    println!();

    let p = &toml.polling;
    println!("[polling]");
    println!(
        "  fast = {}ms x {}, medium = {}ms until poll {}, slow = {}ms",
        p.fast_interval_ms, p.fast_attempts, p.medium_interval_ms, p.medium_attempts, p.slow_interval_ms
    );
    println!("  max_attempts = {}", p.max_attempts);
    println!(
        "  poll_retries = {} ({}ms apart)",
        p.poll_retries, p.poll_retry_delay_ms
    );
    println!();

    println!("[retry]");
    println!("  max_attempts = {}", toml.retry.max_attempts);
    println!("  delay_ms = {}", toml.retry.delay_ms);
    println!();

    println!("[interview]");
    println!("  min_reply_chars = {}", toml.interview.min_reply_chars);
    println!("  keyword_fallback = {}", toml.interview.keyword_fallback);
    println!("  keyword_density = {}", toml.interview.keyword_density);
    println!();

    if !toml.links.is_empty() {
        println!("[[links]]");
        for link in &toml.links {
            println!("  \"{}\" -> {}", link.phrase, link.url);
        }
        println!();
    }
}

pub fn cmd_config(config: &InterviewerConfig, command: Option<ConfigCommands>) -> Result<()> {
    let config_path = config.config_file();

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Interviewer Configuration");
            println!("=========================");
            println!();

            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No interviewer.toml found at {}", config_path.display());
                println!("Using default configuration.");
            }
            println!();
            print_sections(&config.toml);

            // Effective values include environment and CLI overrides.
            println!("Effective values (with env/CLI overrides):");
            println!("  api_base = \"{}\"", config.toml.api_base());
            println!(
                "  assistant_id = {}",
                config
                    .toml
                    .assistant_id()
                    .map(|id| format!("\"{}\"", id))
                    .unwrap_or_else(|| "(unset)".to_string())
            );
            println!(
                "  api key = {}",
                if config.toml.api_key().is_some() {
                    "set"
                } else {
                    "missing"
                }
            );
            println!("  store dir = {}", config.store_dir().display());
            if let Some(dir) = config.log_dir() {
                println!("  log dir = {}", dir.display());
            }
            println!();
            if !config_path.exists() {
                println!("Run 'interviewer config init' to create an interviewer.toml file.");
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            let warnings = config.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!(
                    "interviewer.toml already exists at {}",
                    config_path.display()
                );
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            std::fs::create_dir_all(&config.config_dir)?;
            InterviewerToml::default().save(&config_path)?;

            println!("Created interviewer.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [assistant] assistant_id, api_base, api_key_env");
            println!("  - [polling] and [retry] timings");
            println!("  - [[links]] phrases to link in the interviewer's replies");
            println!();
        }
    }

    Ok(())
}
