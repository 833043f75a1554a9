use std::path::PathBuf;

use clap::Parser;
use geoquiz_engine::BoundKind;

use crate::config::GameConfig;

/// Think of a country; geoquiz narrows it down with yes/no questions.
#[derive(Debug, Parser)]
#[command(
    name = "geoquiz",
    author,
    version,
    about = "Guess the country you are thinking of"
)]
pub struct Cli {
    /// Path to the YAML configuration file (defaults apply when omitted).
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override the RNG seed for question selection.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Play against an offline atlas instead of the SPARQL endpoint.
    #[arg(long, value_name = "FILE")]
    pub atlas: Option<PathBuf>,

    /// Override the SPARQL endpoint URL.
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Comma-separated bounds to enable (trivial, population, adjacency).
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    pub bounds: Option<Vec<BoundKind>>,

    /// Write one JSON line per answered question to this file.
    #[arg(long, value_name = "FILE")]
    pub transcript: Option<PathBuf>,

    /// Override the tracing level (trace, debug, info, warn, error).
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Exit after validating the configuration (no game is played).
    #[arg(long)]
    pub validate_only: bool,

    /// Print every country of the base set and exit.
    #[arg(long)]
    pub list_countries: bool,
}

impl Cli {
    /// Fold command-line overrides into the loaded configuration.
    pub fn apply(&self, config: &mut GameConfig) {
        if let Some(seed) = self.seed {
            config.game.seed = Some(seed);
        }

        if let Some(atlas) = &self.atlas {
            config.knowledge_base.atlas = Some(atlas.clone());
        }

        if let Some(endpoint) = &self.endpoint {
            config.knowledge_base.endpoint = endpoint.clone();
        }

        if let Some(bounds) = &self.bounds {
            config.game.bounds = bounds.clone();
        }

        if let Some(transcript) = &self.transcript {
            config.outputs.transcript = Some(transcript.clone());
        }

        if let Some(level) = &self.log_level {
            config.logging.tracing_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_config_values() {
        let cli = Cli::try_parse_from([
            "geoquiz",
            "--seed",
            "9",
            "--atlas",
            "data/atlas.yaml",
            "--bounds",
            "population,trivial",
            "--log-level",
            "debug",
        ])
        .expect("valid arguments");

        let mut config = GameConfig::default();
        cli.apply(&mut config);
        config.validate().expect("still valid");

        assert_eq!(config.game.seed, Some(9));
        assert_eq!(
            config.knowledge_base.atlas,
            Some(PathBuf::from("data/atlas.yaml"))
        );
        assert_eq!(
            config.game.bounds,
            vec![BoundKind::Population, BoundKind::Trivial]
        );
        assert_eq!(config.logging.tracing_level, "debug");
    }

    #[test]
    fn absent_flags_leave_config_alone() {
        let cli = Cli::try_parse_from(["geoquiz"]).expect("no arguments");
        let mut config = GameConfig::default();
        cli.apply(&mut config);
        assert_eq!(config, GameConfig::default());
        assert!(!cli.validate_only);
        assert!(!cli.list_countries);
    }

    #[test]
    fn unknown_bound_is_rejected() {
        assert!(Cli::try_parse_from(["geoquiz", "--bounds", "trivial,colour"]).is_err());
    }
}
