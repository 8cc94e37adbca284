mod batch;
mod report;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use vigil_core::{EngineConfig, Interaction, MemoryStore, Preset, Scalar, ScoringEngine};
use vigil_store::{ProfileStore, export_json, import_json, load_config, to_toml};

#[derive(Parser)]
#[command(name = "vigil", about = "Interaction risk scoring with historical correlation")]
struct Cli {
    /// Profile whose memory and audit log to use (default: the config name)
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Built-in configuration to use when --config is not given
    #[arg(long, global = true, default_value = "predator-defense")]
    preset: String,

    /// Engine configuration file (.toml or .json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one interaction and remember it
    Score {
        /// Interaction text
        text: String,

        /// Metadata field as key=value (repeatable)
        #[arg(long = "meta", value_name = "KEY=VALUE")]
        meta: Vec<String>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Score every line of a file (plain text or JSON {text, metadata})
    Batch {
        /// Input file, one interaction per line
        file: PathBuf,

        /// Print one JSON result per line
        #[arg(long)]
        json: bool,
    },

    /// Show memory statistics for the profile
    Stats,

    /// List remembered interactions, oldest first
    History {
        /// Show the shared store instead of the profile's local store
        #[arg(long)]
        shared: bool,

        /// Show at most this many of the most recent entries
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Print the effective configuration as TOML
    ShowConfig,

    /// List built-in presets
    Presets,

    /// Export profile memory to a JSON file
    Export {
        /// Output file path
        path: PathBuf,
    },

    /// Import profile memory from a JSON file
    Import {
        /// Input file path
        path: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Score { text, meta, json } => cmd_score(&cli, text, meta, *json),
        Commands::Batch { file, json } => cmd_batch(&cli, file, *json),
        Commands::Stats => cmd_stats(&cli),
        Commands::History { shared, limit } => cmd_history(&cli, *shared, *limit),
        Commands::ShowConfig => cmd_show_config(&cli),
        Commands::Presets => cmd_presets(),
        Commands::Export { path } => cmd_export(&cli, path),
        Commands::Import { path } => cmd_import(&cli, path),
    }
}

fn resolve_config(cli: &Cli) -> Result<EngineConfig> {
    match &cli.config {
        Some(path) => {
            load_config(path)
                .with_context(|| format!("failed to load config {}", path.display()))
        }
        None => {
            let preset: Preset = cli.preset.parse()?;
            Ok(preset.config())
        }
    }
}

fn open_profile(cli: &Cli, config: &EngineConfig) -> Result<ProfileStore> {
    let base_dir = std::env::var("VIGIL_DATA_DIR").ok().map(PathBuf::from);
    let profile = cli.profile.as_deref().unwrap_or(&config.name);
    ProfileStore::open(profile, &config.name, base_dir.as_deref())
        .context("failed to open profile store")
}

fn open_memory(cli: &Cli) -> Result<(EngineConfig, String, MemoryStore)> {
    let config = resolve_config(cli)?;
    let profile = open_profile(cli, &config)?;
    let name = profile.profile().to_string();
    let memory = profile.into_memory_store(config.memory_policy());
    Ok((config, name, memory))
}

fn build_engine(cli: &Cli) -> Result<ScoringEngine> {
    let config = resolve_config(cli)?;
    let profile = open_profile(cli, &config)?;
    let audit = profile.audit_log();
    let memory = profile.into_memory_store(config.memory_policy());
    let engine = ScoringEngine::new(config, memory).context("invalid engine configuration")?;
    Ok(match audit {
        Some(log) => engine.with_audit_sink(Box::new(log)),
        None => engine,
    })
}

/// Parse `key=value`; numbers and booleans keep their type.
fn parse_meta(pair: &str) -> Result<(String, Scalar)> {
    let Some((key, value)) = pair.split_once('=') else {
        bail!("metadata must be key=value, got '{pair}'");
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("metadata key must not be empty in '{pair}'");
    }
    let value = value.trim();
    let scalar = if let Ok(n) = value.parse::<f64>() {
        Scalar::Number(n)
    } else if let Ok(b) = value.parse::<bool>() {
        Scalar::Bool(b)
    } else {
        Scalar::Text(value.to_string())
    };
    Ok((key.to_string(), scalar))
}

fn cmd_score(cli: &Cli, text: &str, meta: &[String], json: bool) -> Result<()> {
    let engine = build_engine(cli)?;
    let mut interaction = Interaction::new(text);
    for pair in meta {
        let (key, value) = parse_meta(pair)?;
        interaction = interaction.with_metadata(key, value);
    }

    let result = engine
        .score(&interaction)
        .context("failed to record interaction")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", report::render_result(&result));
    }
    Ok(())
}

fn cmd_batch(cli: &Cli, file: &Path, json: bool) -> Result<()> {
    let engine = build_engine(cli)?;
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    let summary = batch::score_lines(&engine, &content, json)?;
    eprintln!(
        "scored {} interactions ({} failed, {} malformed)",
        summary.scored, summary.failed, summary.malformed
    );
    Ok(())
}

fn cmd_stats(cli: &Cli) -> Result<()> {
    let (config, profile, memory) = open_memory(cli)?;
    print!("{}", report::render_stats(&config, &profile, &memory));
    Ok(())
}

fn cmd_history(cli: &Cli, shared: bool, limit: usize) -> Result<()> {
    let (_, _, memory) = open_memory(cli)?;
    if shared && !memory.has_shared() {
        println!("shared memory is disabled for this configuration");
        return Ok(());
    }
    let entries: Vec<_> = if shared {
        memory.shared_entries().collect()
    } else {
        memory.local_entries().collect()
    };
    let skip = entries.len().saturating_sub(limit);
    for entry in &entries[skip..] {
        println!("{}", report::render_entry(entry));
    }
    if entries.is_empty() {
        println!("(no entries)");
    }
    Ok(())
}

fn cmd_show_config(cli: &Cli) -> Result<()> {
    let config = resolve_config(cli)?;
    let rendered = to_toml(&config).context("failed to render config")?;
    print!("{rendered}");
    Ok(())
}

fn cmd_presets() -> Result<()> {
    for preset in Preset::ALL {
        let config = preset.config();
        let dims: Vec<_> = config
            .dimension_weights
            .keys()
            .map(String::as_str)
            .collect();
        println!("{:<18} {}", preset.name(), dims.join(", "));
    }
    Ok(())
}

fn cmd_export(cli: &Cli, path: &Path) -> Result<()> {
    let config = resolve_config(cli)?;
    let store = open_profile(cli, &config)?;
    let snapshot = store.export().context("failed to read memory")?;

    let json = export_json(&snapshot).context("failed to serialize memory")?;
    std::fs::write(path, &json)
        .with_context(|| format!("failed to write {}", path.display()))?;

    println!(
        "exported to {}. local={}, shared={}",
        path.display(),
        snapshot.local.len(),
        snapshot.shared.len()
    );
    Ok(())
}

fn cmd_import(cli: &Cli, path: &Path) -> Result<()> {
    let config = resolve_config(cli)?;
    let store = open_profile(cli, &config)?;
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let snapshot = import_json(&json).context("invalid memory export")?;
    store.import(&snapshot).context("failed to import memory")?;

    println!(
        "imported from {}. local={}, shared={}",
        path.display(),
        snapshot.local.len(),
        snapshot.shared.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_meta_types() {
        assert_eq!(
            parse_meta("load=0.8").unwrap(),
            ("load".into(), Scalar::Number(0.8))
        );
        assert_eq!(
            parse_meta("ok=true").unwrap(),
            ("ok".into(), Scalar::Bool(true))
        );
        assert_eq!(
            parse_meta("src = web ").unwrap(),
            ("src".into(), Scalar::Text("web".into()))
        );
    }

    #[test]
    fn test_parse_meta_rejects_malformed() {
        assert!(parse_meta("novalue").is_err());
        assert!(parse_meta("=1").is_err());
    }
}
