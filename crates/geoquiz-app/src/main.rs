use std::io;

use anyhow::Context;
use clap::Parser;

use geoquiz_app::cli::Cli;
use geoquiz_app::config::GameConfig;
use geoquiz_app::console::ConsolePlayer;
use geoquiz_app::logging::init_logging;
use geoquiz_app::session::{build_knowledge_base, list_countries, play, render_outcome};
use geoquiz_core::AppInfo;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => GameConfig::from_path(path)?,
        None => GameConfig::default(),
    };

    cli.apply(&mut config);
    config.validate()?;

    let logging_guard = init_logging(&config.logging)?;
    if let Some(guard) = logging_guard.as_ref() {
        eprintln!("Structured logs: {}", guard.log_path.display());
    }

    if cli.validate_only {
        println!("Validation-only mode: configuration is valid, no game played.");
        return Ok(());
    }

    let kb = build_knowledge_base(&config.knowledge_base)?;

    if cli.list_countries {
        let count = list_countries(kb.as_ref(), &mut io::stdout().lock())
            .context("printing the country list")?;
        eprintln!("{count} countries");
        return Ok(());
    }

    println!(
        "{} v{}. {} and answer each question with yes or no.\n",
        AppInfo::name(),
        AppInfo::version(),
        AppInfo::tagline()
    );

    let summary = play(&config, kb, Box::new(ConsolePlayer::stdio()))?;
    println!("{}", render_outcome(&summary.outcome));
    if let Some(transcript) = summary.transcript.as_ref() {
        println!(
            "Transcript: {} rows at {}",
            transcript.rows,
            transcript.path.display()
        );
    }

    Ok(())
}
