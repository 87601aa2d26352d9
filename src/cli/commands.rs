//! CLI command definitions for tableserializer.
//!
//! Provides commands to sample a table, serialize it according to an
//! experiment configuration, and describe a configuration.

use crate::config::ExperimentConfig;
use crate::processor::TableFormat;
use crate::sampling::{SamplerConfig, SamplingStrategy, DEFAULT_ROWS_TO_SAMPLE};
use crate::schema::Metadata;
use crate::table::Table;
use anyhow::Context;
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Table serialization for text embedding models.
#[derive(Parser)]
#[command(name = "tableserializer")]
#[command(about = "Serialize tables into text for embedding models")]
#[command(version)]
#[command(
    long_about = "tableserializer flattens JSON tables into text, optionally with context and schema, \
and can reduce large tables to a few representative rows first.\n\nExample usage:\n  \
tableserializer sample --input table.json --strategy k-means --rows 5 --seed 42"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Sample rows from a table and print the result.
    Sample(SampleArgs),

    /// Serialize a table using an experiment configuration.
    #[command(alias = "ser")]
    Serialize(SerializeArgs),

    /// Print the description and slug of an experiment configuration.
    Describe(DescribeArgs),
}

/// Row sampling strategy as accepted on the command line.
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum StrategyArg {
    First,
    Random,
    #[value(name = "k-means", alias = "kmeans")]
    KMeans,
}

impl From<StrategyArg> for SamplingStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::First => SamplingStrategy::First,
            StrategyArg::Random => SamplingStrategy::Random,
            StrategyArg::KMeans => SamplingStrategy::KMeans,
        }
    }
}

/// Table layout as accepted on the command line.
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum FormatArg {
    Json,
    Markdown,
}

impl From<FormatArg> for TableFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => TableFormat::Json,
            FormatArg::Markdown => TableFormat::Markdown,
        }
    }
}

/// Arguments for `tableserializer sample`.
#[derive(Parser, Debug)]
pub struct SampleArgs {
    /// JSON table: a list of objects, or a list of lists with a header row.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Sampling strategy.
    #[arg(short, long, value_enum, default_value = "k-means")]
    pub strategy: StrategyArg,

    /// Maximum number of rows to keep.
    #[arg(short = 'n', long, default_value_t = DEFAULT_ROWS_TO_SAMPLE)]
    pub rows: usize,

    /// Seed for reproducible sampling.
    #[arg(long, env = "TABLESERIALIZER_SEED")]
    pub seed: Option<u64>,

    /// Output layout.
    #[arg(short, long, value_enum, default_value = "markdown")]
    pub format: FormatArg,
}

/// Arguments for `tableserializer serialize`.
#[derive(Parser, Debug)]
pub struct SerializeArgs {
    /// YAML experiment configuration.
    #[arg(short, long)]
    pub config: PathBuf,

    /// JSON table: a list of objects, or a list of lists with a header row.
    #[arg(short, long)]
    pub input: PathBuf,

    /// JSON object with table metadata for the context section.
    #[arg(long)]
    pub context: Option<PathBuf>,
}

/// Arguments for `tableserializer describe`.
#[derive(Parser, Debug)]
pub struct DescribeArgs {
    /// YAML experiment configuration.
    #[arg(short, long)]
    pub config: PathBuf,
}

/// Parses command-line arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Runs the command selected in `cli`.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Sample(args) => run_sample_command(args)?,
        Commands::Serialize(args) => run_serialize_command(args)?,
        Commands::Describe(args) => run_describe_command(args)?,
    }
    Ok(())
}

fn load_table(path: &Path) -> anyhow::Result<Table> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read table from {}", path.display()))?;
    let table = Table::from_json_str(&content)
        .with_context(|| format!("Failed to parse table in {}", path.display()))?;
    info!(
        path = %path.display(),
        rows = table.len(),
        columns = table.columns().len(),
        "Loaded table"
    );
    Ok(table)
}

fn load_context(path: &Path) -> anyhow::Result<Metadata> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read context from {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Context in {} must be a JSON object", path.display()))
}

fn run_sample_command(args: SampleArgs) -> anyhow::Result<()> {
    let table = load_table(&args.input)?;

    let config = SamplerConfig::new(args.rows)?.with_optional_seed(args.seed);
    let strategy = SamplingStrategy::from(args.strategy);
    let mut sampler = strategy.build(config);

    let sampled = sampler.sample(&table);
    info!(
        strategy = %strategy,
        rows_before = table.len(),
        rows_after = sampled.len(),
        "Sampled table"
    );

    let processor = TableFormat::from(args.format).processor();
    println!("{}", processor.serialize_table(&sampled));
    Ok(())
}

fn run_serialize_command(args: SerializeArgs) -> anyhow::Result<()> {
    let experiment = ExperimentConfig::from_yaml_file(&args.config)?;
    info!(experiment = %experiment, "Using experiment configuration");

    let table = load_table(&args.input)?;
    let context = args.context.as_deref().map(load_context).transpose()?;

    let mut serializer = experiment.get_serializer()?;
    let text = serializer.serialize_table(&table, context.as_ref())?;
    println!("{}", text);
    Ok(())
}

fn run_describe_command(args: DescribeArgs) -> anyhow::Result<()> {
    let experiment = ExperimentConfig::from_yaml_file(&args.config)?;
    println!("{}", experiment);
    println!("slug: {}", experiment.slug());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sample_args() {
        let cli = Cli::try_parse_from([
            "tableserializer",
            "sample",
            "--input",
            "t.json",
            "--strategy",
            "kmeans",
            "-n",
            "4",
            "--seed",
            "7",
        ])
        .expect("valid args");

        match cli.command {
            Commands::Sample(args) => {
                assert!(matches!(args.strategy, StrategyArg::KMeans));
                assert_eq!(args.rows, 4);
                assert_eq!(args.seed, Some(7));
                assert!(matches!(args.format, FormatArg::Markdown));
            }
            _ => panic!("expected sample command"),
        }
    }

    #[test]
    fn test_run_sample_command() {
        let dir = tempfile::tempdir().expect("temp dir");
        let input = dir.path().join("table.json");
        fs::write(&input, r#"[["k", "v"], ["a", 1], ["b", 2], ["a", 3]]"#).expect("write table");

        let args = SampleArgs {
            input,
            strategy: StrategyArg::First,
            rows: 2,
            seed: None,
            format: FormatArg::Json,
        };
        assert!(run_sample_command(args).is_ok());
    }

    #[test]
    fn test_load_table_missing_file() {
        let err = load_table(Path::new("/nonexistent/table.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read table"));
    }
}
