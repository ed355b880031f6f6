//! Skosmos CLI
//!
//! Drives the SKOS import stages from a terminal:
//! - `import`: fetch + parse, writes concepts as JSON
//! - `fetch` / `parse`: run one stage, passing the N-Triples artifact between them
//! - `clear`: forget a feed's incremental state
//! - `fields`: list the concept fields a mapping can read

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use colored::Colorize;
use skosmos_feeds::{
    clear_feed, discard_artifact, fetch_feed, import_feed, mapping_sources, parse_artifact,
    Concept, Feed, FeedConfig, FileCache, GraphLoader, HttpSource, UriCache,
};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "skosmos")]
#[command(
    author,
    version,
    about = "Import SKOS vocabularies from a Skosmos terminology service"
)]
struct Cli {
    /// Raise log verbosity (`-v` debug, `-vv` trace). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and parse a vocabulary, writing the concepts as JSON.
    Import {
        #[command(flatten)]
        feed: FeedArgs,
        /// Output JSON file (default: stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Fetch a vocabulary into an N-Triples artifact and print the fetched URIs.
    Fetch {
        #[command(flatten)]
        feed: FeedArgs,
        /// Where to keep the artifact (default: left in the temp directory)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Extract concepts from an N-Triples artifact.
    Parse {
        #[command(flatten)]
        feed: FeedArgs,
        /// Artifact written by `fetch`
        artifact: PathBuf,
        /// File of fetched URIs, one per line, as printed by `fetch`.
        /// Required to emit anything in incremental mode.
        #[arg(long)]
        fetched: Option<PathBuf>,
        /// Output JSON file (default: stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Forget the incremental fetch and parse state of a feed.
    Clear {
        #[command(flatten)]
        feed: FeedArgs,
    },

    /// List the concept fields available as mapping sources.
    Fields {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Clone)]
struct FeedArgs {
    /// Feed configuration JSON; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,
    /// Stable feed identifier (scopes the cache)
    #[arg(long, default_value = "1")]
    feed_id: String,
    /// URI of the ConceptScheme to import
    #[arg(long)]
    scheme: String,
    /// Skosmos REST data endpoint, e.g. http://host/rest/v1/data
    #[arg(long)]
    application_uri: Option<String>,
    /// Only fetch what previous runs have not
    #[arg(long)]
    incremental: bool,
    /// Leaf concept budget of an incremental run
    #[arg(long)]
    max_leaf_concepts: Option<usize>,
    /// Preferred language tag for labels and notes
    #[arg(long)]
    language: Option<String>,
    /// Visited-URI cache file
    #[arg(long, default_value = ".skosmos-cache.json")]
    cache_file: PathBuf,
}

impl FeedArgs {
    fn to_feed(&self) -> Result<Feed> {
        let mut config = match &self.config {
            Some(path) => FeedConfig::from_json_file(path)?,
            None => FeedConfig::default(),
        };
        if let Some(uri) = &self.application_uri {
            config.application_uri = uri.clone();
        }
        if self.incremental {
            config.incremental_fetch = true;
        }
        if let Some(max) = self.max_leaf_concepts {
            config.max_number_of_leaf_concepts = max;
        }
        if let Some(language) = &self.language {
            config.preferred_language = Some(language.clone());
        }
        let feed = Feed::new(self.feed_id.clone(), self.scheme.clone(), config);
        feed.validate()?;
        Ok(feed)
    }

    /// Run `f` against the file cache and save it afterwards, also when `f`
    /// fails: marks made before a failure are still valid.
    fn with_cache<T>(&self, f: impl FnOnce(&mut UriCache<FileCache>) -> Result<T>) -> Result<T> {
        let backend = FileCache::open(&self.cache_file)
            .with_context(|| format!("failed to open cache {}", self.cache_file.display()))?;
        let mut cache = UriCache::new(backend);
        let result = f(&mut cache);
        cache
            .into_inner()
            .save()
            .with_context(|| format!("failed to save cache {}", self.cache_file.display()))?;
        result
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Import { feed, out } => cmd_import(&feed, out.as_deref()),
        Commands::Fetch { feed, out } => cmd_fetch(&feed, out.as_deref()),
        Commands::Parse {
            feed,
            artifact,
            fetched,
            out,
        } => cmd_parse(&feed, &artifact, fetched.as_deref(), out.as_deref()),
        Commands::Clear { feed } => cmd_clear(&feed),
        Commands::Fields { json } => cmd_fields(json),
    }
}

// ============================================================================
// Commands
// ============================================================================

fn loader_for(feed: &Feed) -> Result<GraphLoader<HttpSource>> {
    let source = HttpSource::new(&feed.config).context("failed to build HTTP client")?;
    Ok(GraphLoader::new(source))
}

fn cmd_import(args: &FeedArgs, out: Option<&Path>) -> Result<()> {
    let feed = args.to_feed()?;
    let loader = loader_for(&feed)?;
    let mut concepts: Vec<Concept> = Vec::new();

    let summary = args.with_cache(|cache| {
        import_feed(&feed, &loader, cache, &mut concepts)
            .with_context(|| format!("import of {} failed", feed.source))
    })?;

    for message in &summary.messages {
        eprintln!("{} {}", "ok".green().bold(), message);
    }
    if summary.budget_exhausted {
        eprintln!(
            "{} leaf budget reached; run again to continue",
            "note".yellow().bold()
        );
    }
    write_concepts(&concepts, out)
}

fn cmd_fetch(args: &FeedArgs, out: Option<&Path>) -> Result<()> {
    let feed = args.to_feed()?;
    let loader = loader_for(&feed)?;

    let outcome = args.with_cache(|cache| {
        fetch_feed(&feed, &loader, cache, None)
            .with_context(|| format!("fetch of {} failed", feed.source))
    })?;

    let artifact = match out {
        Some(out) => {
            fs::copy(&outcome.artifact, out)
                .with_context(|| format!("failed to write {}", out.display()))?;
            discard_artifact(&outcome.artifact);
            out.to_path_buf()
        }
        None => outcome.artifact.clone(),
    };

    eprintln!("{} {}", "ok".green().bold(), outcome.message);
    eprintln!("{} {}", "wrote".green().bold(), artifact.display().to_string().bold());
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    for uri in &outcome.fetched {
        writeln!(lock, "{uri}")?;
    }
    Ok(())
}

fn cmd_parse(
    args: &FeedArgs,
    artifact: &Path,
    fetched: Option<&Path>,
    out: Option<&Path>,
) -> Result<()> {
    let feed = args.to_feed()?;
    let uris_to_parse = match fetched {
        Some(path) => read_uri_list(path)?,
        None => Vec::new(),
    };
    if feed.config.incremental_fetch && fetched.is_none() {
        tracing::warn!("incremental parse without --fetched emits nothing");
    }

    let report = args.with_cache(|cache| {
        parse_artifact(&feed, artifact, &uris_to_parse, cache)
            .with_context(|| format!("failed to parse {}", artifact.display()))
    })?;

    eprintln!("{} {}", "ok".green().bold(), report.message);
    write_concepts(&report.concepts, out)
}

fn cmd_clear(args: &FeedArgs) -> Result<()> {
    let feed = args.to_feed()?;
    args.with_cache(|cache| {
        clear_feed(&feed, cache);
        Ok(())
    })?;
    eprintln!("{} cleared caches of feed {}", "ok".green().bold(), feed.id);
    Ok(())
}

fn cmd_fields(json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(mapping_sources())?);
        return Ok(());
    }
    for source in mapping_sources() {
        println!(
            "{:<14} {:<18} {}",
            source.field.bold(),
            source.label,
            source.description
        );
    }
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn read_uri_list(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

fn write_concepts(concepts: &[Concept], out: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(concepts)?;
    match out {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!(
                "{} {} ({} concepts)",
                "wrote".green().bold(),
                path.display().to_string().bold(),
                concepts.len()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args(extra: &[&str]) -> FeedArgs {
        let mut argv = vec![
            "skosmos",
            "clear",
            "--scheme",
            "http://data.example.com/vocabulary",
            "--application-uri",
            "http://skosmos.example.com/rest/v1/data",
        ];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).expect("parse args").command {
            Commands::Clear { feed } => feed,
            _ => unreachable!(),
        }
    }

    #[test]
    fn flags_override_the_config_file() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("feed.json");
        fs::write(
            &config,
            r#"{"application_uri": "http://other.example.com/rest/v1/data", "max_number_of_leaf_concepts": 3, "preferred_language": "fr"}"#,
        )
        .unwrap();

        let config_arg = config.to_string_lossy().to_string();
        let feed = args(&["--config", &config_arg, "--incremental", "--language", "en"])
            .to_feed()
            .unwrap();

        assert_eq!(feed.config.application_uri, "http://skosmos.example.com/rest/v1/data");
        assert!(feed.config.incremental_fetch);
        assert_eq!(feed.config.max_number_of_leaf_concepts, 3);
        assert_eq!(feed.config.preferred_language.as_deref(), Some("en"));
    }

    #[test]
    fn invalid_scheme_uri_is_rejected() {
        let mut feed_args = args(&[]);
        feed_args.scheme = "urn:not-http".to_string();
        assert!(feed_args.to_feed().is_err());
    }

    #[test]
    fn cache_is_saved_even_when_the_command_fails() {
        let dir = tempdir().unwrap();
        let cache_file = dir.path().join("cache.json");
        let cache_arg = cache_file.to_string_lossy().to_string();
        let feed_args = args(&["--cache-file", &cache_arg]);

        let result: Result<()> = feed_args.with_cache(|cache| {
            cache.mark_visited("http://data.example.com/concepts/a", "k");
            anyhow::bail!("boom")
        });
        assert!(result.is_err());

        let reopened = UriCache::new(FileCache::open(&cache_file).unwrap());
        assert!(reopened.is_visited("http://data.example.com/concepts/a", "k"));
    }

    #[test]
    fn uri_list_skips_blank_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fetched.txt");
        fs::write(&path, "http://a\n\n  http://b  \n").unwrap();
        assert_eq!(read_uri_list(&path).unwrap(), vec!["http://a", "http://b"]);
    }
}
