use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use geoquiz_core::knowledge::{Atlas, KnowledgeBase, WikidataClient};
use geoquiz_engine::{GameOutcome, Orchestrator, Player, TurnReport, build_bounds};
use tracing::{Level, event};

use crate::config::{GameConfig, KnowledgeBaseConfig};
use crate::transcript::TranscriptWriter;

/// What a finished game leaves behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub outcome: GameOutcome,
    pub seed: u64,
    pub transcript: Option<TranscriptSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptSummary {
    pub path: PathBuf,
    pub rows: usize,
}

/// The offline atlas when one is configured, the SPARQL endpoint otherwise.
pub fn build_knowledge_base(config: &KnowledgeBaseConfig) -> Result<Box<dyn KnowledgeBase>> {
    if let Some(path) = &config.atlas {
        let atlas = Atlas::from_path(path)
            .with_context(|| format!("loading atlas from {}", path.display()))?;
        event!(
            target: "geoquiz_app::session",
            Level::INFO,
            atlas = %path.display(),
            countries = atlas.country_list().len(),
            "using offline atlas"
        );
        return Ok(Box::new(atlas));
    }

    let client = WikidataClient::new(config.wikidata_options())
        .context("creating the SPARQL client")?;
    event!(
        target: "geoquiz_app::session",
        Level::INFO,
        endpoint = %config.endpoint,
        base_set = ?config.base_set,
        "using SPARQL endpoint"
    );
    Ok(Box::new(client))
}

/// Print every country of the base set, one per line. Returns how many.
pub fn list_countries(kb: &dyn KnowledgeBase, out: &mut dyn Write) -> Result<usize> {
    let countries = kb.countries().context("listing countries")?;
    for country in &countries {
        writeln!(out, "{country}")?;
    }
    Ok(countries.len())
}

/// Play one game to its end, writing the transcript as it goes.
pub fn play(
    config: &GameConfig,
    kb: Box<dyn KnowledgeBase>,
    player: Box<dyn Player>,
) -> Result<SessionSummary> {
    let seed = config.game.seed.unwrap_or_else(rand::random);
    let bounds = build_bounds(&config.game.bounds);
    event!(
        target: "geoquiz_app::session",
        Level::INFO,
        seed,
        bounds = ?config.game.bounds,
        "starting game"
    );

    let mut transcript = match &config.outputs.transcript {
        Some(path) => Some(
            TranscriptWriter::create(path)
                .with_context(|| format!("creating transcript at {}", path.display()))?,
        ),
        None => None,
    };

    let mut game = Orchestrator::with_seed(kb, bounds, player, seed);
    let outcome = loop {
        let report = game
            .turn()
            .with_context(|| format!("game stopped after {} answers", game.answered()))?;
        match report {
            TurnReport::Continue(record) => {
                if let Some(writer) = transcript.as_mut() {
                    writer.record(&record).context("writing transcript row")?;
                }
            }
            TurnReport::Stop(outcome) => break outcome,
        }
    };

    Ok(SessionSummary {
        outcome,
        seed,
        transcript: transcript.map(|writer| TranscriptSummary {
            path: writer.path().to_path_buf(),
            rows: writer.rows(),
        }),
    })
}

pub fn render_outcome(outcome: &GameOutcome) -> String {
    match outcome {
        GameOutcome::Won { country, turns } => format!(
            "Your country is {}! Found after {turns} question{}.",
            country.name,
            if *turns == 1 { "" } else { "s" }
        ),
        GameOutcome::Contradiction { turns } => format!(
            "No country matches all of your answers ({turns} question{}).",
            if *turns == 1 { "" } else { "s" }
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoquiz_core::model::country::{Country, EntityId};
    use geoquiz_engine::Prompt;
    use std::fs;
    use std::io;

    fn id(raw: &str) -> EntityId {
        EntityId::parse(raw).unwrap()
    }

    struct AlwaysNo;

    impl Player for AlwaysNo {
        fn ask(&mut self, _prompt: &Prompt<'_>) -> io::Result<bool> {
            Ok(false)
        }
    }

    fn trio() -> Atlas {
        Atlas::new()
            .with_country(id("Q1"), "Alpha", None, vec![])
            .with_country(id("Q2"), "Beta", None, vec![])
            .with_country(id("Q3"), "Gamma", None, vec![])
    }

    #[test]
    fn rejecting_every_guess_leaves_the_last_country() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut config = GameConfig::default();
        config.game.seed = Some(5);
        config.game.bounds = vec![geoquiz_engine::BoundKind::Trivial];
        config.outputs.transcript = Some(dir.path().join("game.jsonl"));

        let summary = play(&config, Box::new(trio()), Box::new(AlwaysNo)).expect("game runs");
        let GameOutcome::Won { turns, .. } = &summary.outcome else {
            panic!("expected a win, got {:?}", summary.outcome);
        };
        assert_eq!(*turns, 2);
        assert_eq!(summary.seed, 5);

        let transcript = summary.transcript.expect("transcript written");
        assert_eq!(transcript.rows, 2);
        let contents = fs::read_to_string(&transcript.path).expect("readable");
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn offline_atlas_is_loaded_from_config() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("atlas.yaml");
        fs::write(&path, "countries:\n  - { id: Q38, name: Italy }\n").expect("write atlas");

        let mut config = KnowledgeBaseConfig::default();
        config.atlas = Some(path);
        let kb = build_knowledge_base(&config).expect("atlas loads");

        let mut out = Vec::new();
        assert_eq!(list_countries(kb.as_ref(), &mut out).unwrap(), 1);
        assert_eq!(String::from_utf8(out).unwrap(), "Italy (Q38)\n");
    }

    #[test]
    fn missing_atlas_names_the_file() {
        let mut config = KnowledgeBaseConfig::default();
        config.atlas = Some(PathBuf::from("/no/such/atlas.yaml"));
        let err = build_knowledge_base(&config).err().expect("missing file");
        assert!(format!("{err:#}").contains("/no/such/atlas.yaml"));
    }

    #[test]
    fn outcomes_render_for_the_player() {
        let won = GameOutcome::Won {
            country: Country::new(id("Q142"), "France"),
            turns: 7,
        };
        assert_eq!(render_outcome(&won), "Your country is France! Found after 7 questions.");
        assert_eq!(
            render_outcome(&GameOutcome::Contradiction { turns: 1 }),
            "No country matches all of your answers (1 question)."
        );
    }
}
