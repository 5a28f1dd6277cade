use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use paper_discovery::config::{find_config_file, load_config, Config, LogFormat, TopicEntry};
use paper_discovery::models::{
    DiscoveryOutcome, NoPdfAction, Paper, PdfStrategy, ProviderMetrics, ProviderType, Timeframe,
    Topic,
};
use paper_discovery::providers::CapabilityMatrix;
use paper_discovery::Discovery;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Paper Discovery - find and rank academic papers across search providers
#[derive(Parser, Debug)]
#[command(name = "paper-discovery")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Find and rank academic papers across multiple search providers", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Per-provider timeout in seconds (overrides configuration)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

impl OutputFormat {
    fn resolve(self) -> Self {
        match self {
            OutputFormat::Auto if std::io::stdout().is_terminal() => OutputFormat::Table,
            OutputFormat::Auto => OutputFormat::Json,
            other => other,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum PdfStrategyArg {
    QualityFirst,
    PdfRequired,
    ArxivSupplement,
}

impl From<PdfStrategyArg> for PdfStrategy {
    fn from(arg: PdfStrategyArg) -> Self {
        match arg {
            PdfStrategyArg::QualityFirst => PdfStrategy::QualityFirst,
            PdfStrategyArg::PdfRequired => PdfStrategy::PdfRequired,
            PdfStrategyArg::ArxivSupplement => PdfStrategy::ArxivSupplement,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum NoPdfActionArg {
    MetadataOnly,
    Skip,
    FlagForManual,
}

impl From<NoPdfActionArg> for NoPdfAction {
    fn from(arg: NoPdfActionArg) -> Self {
        match arg {
            NoPdfActionArg::MetadataOnly => NoPdfAction::MetadataOnly,
            NoPdfActionArg::Skip => NoPdfAction::Skip,
            NoPdfActionArg::FlagForManual => NoPdfAction::FlagForManual,
        }
    }
}

/// Topic options shared by `discover` and `recommend`
#[derive(clap::Args, Debug)]
struct TopicArgs {
    /// Search query
    query: String,

    /// Provider to use (arxiv, semantic_scholar, huggingface); disables auto-selection
    #[arg(long, short)]
    provider: Option<ProviderType>,

    /// Only consider providers that report citations
    #[arg(long)]
    min_citations: Option<u32>,

    /// Maximum number of results per provider
    #[arg(long, short = 'n', default_value_t = paper_discovery::models::DEFAULT_MAX_RESULTS)]
    max_results: usize,

    /// Only papers published in or after this year
    #[arg(long, conflicts_with = "recent_hours")]
    since_year: Option<i32>,

    /// Only papers published in the last N hours
    #[arg(long)]
    recent_hours: Option<u32>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Discover papers for a single query
    #[command(visible_alias = "d")]
    Discover {
        #[command(flatten)]
        topic: TopicArgs,

        /// Query every available provider and compare them
        #[arg(long, short)]
        benchmark: bool,

        /// Rank results by quality score
        #[arg(long, short)]
        rank: bool,

        /// Drop ranked papers scoring below this value (0-100)
        #[arg(long, default_value_t = 0.0)]
        min_score: f64,

        /// How to treat papers without a PDF
        #[arg(long, value_enum, default_value_t = PdfStrategyArg::QualityFirst)]
        pdf_strategy: PdfStrategyArg,

        /// Action recorded for papers without a PDF
        #[arg(long, value_enum, default_value_t = NoPdfActionArg::MetadataOnly)]
        no_pdf_action: NoPdfActionArg,

        /// PDF availability rate below which arXiv supplements the results
        #[arg(long, default_value_t = paper_discovery::models::DEFAULT_SUPPLEMENT_THRESHOLD)]
        supplement_threshold: f64,

        /// Fall back to the next provider when the selected one fails
        #[arg(long)]
        fallback: bool,

        /// Print per-provider metrics after the results
        #[arg(long, short)]
        metrics: bool,
    },

    /// Discover papers for every topic in the configuration file
    Run {
        /// Only run topics whose name or query contains this text
        #[arg(long)]
        filter: Option<String>,

        /// Print per-provider metrics for each topic
        #[arg(long, short)]
        metrics: bool,
    },

    /// Show which provider a query would be routed to, and why
    Recommend {
        #[command(flatten)]
        topic: TopicArgs,
    },

    /// List providers, their capabilities and availability
    Providers,

    /// Score papers from a JSON file (as written by `discover -o json`)
    Score {
        /// JSON file containing an array of papers
        file: PathBuf,

        /// Drop papers scoring below this value (0-100)
        #[arg(long, default_value_t = 0.0)]
        min_score: f64,
    },

    /// Write a default configuration file
    InitConfig {
        /// Destination (defaults to ./paper-discovery.toml)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl TopicArgs {
    fn builder(&self) -> paper_discovery::models::TopicBuilder {
        let mut builder = Topic::builder(self.query.clone()).max_results(self.max_results);

        if let Some(provider) = self.provider {
            builder = builder.provider(provider).auto_select(false);
        }
        if let Some(min) = self.min_citations {
            builder = builder.min_citations(min);
        }
        if let Some(year) = self.since_year {
            builder = builder.timeframe(Timeframe::SinceYear { year });
        }
        if let Some(hours) = self.recent_hours {
            builder = builder.timeframe(Timeframe::Recent { hours });
        }
        builder
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(secs) = cli.timeout {
        config.discovery.provider_timeout_secs = secs;
    }

    init_tracing(&cli, &config);

    if let Some(path) = cli.config.clone().or_else(find_config_file) {
        tracing::debug!("Using config file: {}", path.display());
    }

    let output = cli.output.resolve();

    match cli.command {
        Commands::Discover {
            topic,
            benchmark,
            rank,
            min_score,
            pdf_strategy,
            no_pdf_action,
            supplement_threshold,
            fallback,
            metrics,
        } => {
            if !(0.0..=100.0).contains(&min_score) {
                anyhow::bail!("--min-score must be within 0..=100");
            }
            if !(0.0..=1.0).contains(&supplement_threshold) {
                anyhow::bail!("--supplement-threshold must be within 0..=1");
            }

            let topic = topic
                .builder()
                .benchmark(benchmark)
                .quality_ranking(rank || min_score > 0.0)
                .min_quality_score(min_score)
                .pdf_strategy(pdf_strategy.into())
                .no_pdf_action(no_pdf_action.into())
                .supplement_threshold(supplement_threshold)
                .build();

            if fallback {
                config.discovery.fallback_enabled = true;
            }
            let discovery = Discovery::from_config(&config)?;
            let outcome = discovery.discover_with_metrics(&topic).await?;
            output_outcome(&outcome, output, metrics);
        }

        Commands::Run { filter, metrics } => {
            let topics = config.topics()?;
            if topics.is_empty() {
                anyhow::bail!("No topics configured; add [[topics]] entries to the config file");
            }

            let entries: Vec<(&TopicEntry, Topic)> = config
                .topics
                .iter()
                .zip(topics)
                .filter(|(entry, _)| {
                    filter
                        .as_deref()
                        .map_or(true, |f| entry.label().contains(f) || entry.query.contains(f))
                })
                .collect();

            let discovery = Discovery::from_config(&config)?;
            let mut failures = 0;
            for (entry, topic) in entries {
                tracing::info!(topic = entry.label(), "Running topic");
                match discovery.discover_with_metrics(&topic).await {
                    Ok(outcome) => {
                        if output != OutputFormat::Json {
                            println!("== {} ({} papers)", entry.label(), outcome.papers.len());
                        }
                        output_outcome(&outcome, output, metrics);
                    }
                    Err(e) => {
                        failures += 1;
                        tracing::error!(topic = entry.label(), error = %e, "Topic failed");
                        if e.is_fatal() {
                            return Err(e.into());
                        }
                    }
                }
            }
            if failures > 0 {
                anyhow::bail!("{} topic(s) failed", failures);
            }
        }

        Commands::Recommend { topic } => {
            let discovery = Discovery::from_config(&config)?;
            let topic = topic.builder().build();
            let available = discovery.available_providers();
            let recommendation = discovery.recommend(&topic)?;

            match output {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "provider": recommendation.provider,
                        "reason": recommendation.rule.to_string(),
                        "available": available,
                    }))?
                ),
                _ => println!("{}", recommendation),
            }
        }

        Commands::Providers => {
            let discovery = Discovery::from_config(&config)?;
            output_providers(&discovery, output)?;
        }

        Commands::Score { file, min_score } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let papers: Vec<Paper> = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse papers from {}", file.display()))?;

            let scorer = config.quality.scorer()?;
            let ranked = scorer.rank_papers(&papers, min_score);
            output_papers(&ranked, output)?;
        }

        Commands::InitConfig { path, force } => {
            let path = path.unwrap_or_else(|| PathBuf::from(paper_discovery::config::CONFIG_FILE_NAME));
            if path.exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
            }

            let mut template = Config::default();
            template.api_keys.semantic_scholar = None;
            template.topics.push(TopicEntry::new("retrieval augmented generation"));
            template.save(&path)?;
            println!("Wrote {}", path.display());
        }
    }

    Ok(())
}

fn init_tracing(cli: &Cli, config: &Config) {
    let level = if cli.quiet {
        "error".to_string()
    } else {
        match cli.verbose {
            0 => config.logging.level.clone(),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("paper_discovery={}", level)));

    let registry = tracing_subscriber::registry().with(filter);
    if cli.log_json || config.logging.format == LogFormat::Json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn output_outcome(outcome: &DiscoveryOutcome, format: OutputFormat, show_metrics: bool) {
    if format == OutputFormat::Json {
        let value = if show_metrics || outcome.comparison.is_some() {
            serde_json::to_string_pretty(outcome)
        } else {
            serde_json::to_string_pretty(&outcome.papers)
        };
        match value {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::error!(error = %e, "Failed to serialize results"),
        }
        return;
    }

    if let Err(e) = output_papers(&outcome.papers, format) {
        tracing::error!(error = %e, "Failed to print results");
    }

    if outcome.supplemented > 0 {
        println!("{} paper(s) added from arXiv", outcome.supplemented);
    }

    if let Some(comparison) = &outcome.comparison {
        output_metrics(&comparison.metrics, format);
        println!(
            "Unique papers: {}  Overlap: {}  Fastest: {}  Most results: {}",
            comparison.total_unique_papers,
            comparison.overlap_count,
            comparison
                .fastest_provider
                .map_or("-".to_string(), |p| p.to_string()),
            comparison
                .most_results_provider
                .map_or("-".to_string(), |p| p.to_string()),
        );
    } else if show_metrics {
        output_metrics(&outcome.metrics, format);
    }
}

fn output_papers(papers: &[Paper], format: OutputFormat) -> Result<()> {
    match format.resolve() {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(papers)?);
        }
        OutputFormat::Plain => {
            for paper in papers {
                let score = paper
                    .quality_score
                    .map(|s| format!("[{:.1}] ", s))
                    .unwrap_or_default();
                println!("{}{} ({})", score, paper.title, paper.source);
                if !paper.authors.is_empty() {
                    println!("  Authors: {}", paper.author_names().join(", "));
                }
                if let Some(ref url) = paper.url {
                    println!("  URL: {}", url);
                }
                if let Some(ref doi) = paper.doi {
                    println!("  DOI: {}", doi);
                }
                if let Some(ref pdf_url) = paper.pdf_url {
                    println!("  PDF: {}", pdf_url);
                }
                println!();
            }
        }
        OutputFormat::Table | OutputFormat::Auto => {
            use comfy_table::{Attribute, Cell, Table};
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["Score", "Title", "Year", "Citations", "PDF", "Source"]);

            for paper in papers {
                table.add_row(vec![
                    Cell::new(
                        paper
                            .quality_score
                            .map(|s| format!("{:.1}", s))
                            .unwrap_or_default(),
                    ),
                    Cell::new(truncate(&paper.title, 60)).add_attribute(Attribute::Bold),
                    Cell::new(paper.year.map(|y| y.to_string()).unwrap_or_default()),
                    Cell::new(
                        paper
                            .citation_count
                            .map(|c| c.to_string())
                            .unwrap_or_default(),
                    ),
                    Cell::new(if paper.pdf_available { "yes" } else { "no" }),
                    Cell::new(paper.source.to_string()),
                ]);
            }
            println!("{table}");
        }
    }
    Ok(())
}

fn output_metrics(metrics: &[ProviderMetrics], format: OutputFormat) {
    if format == OutputFormat::Plain {
        for m in metrics {
            println!(
                "{}: {} in {} ms ({})",
                m.provider,
                m.result_count,
                m.latency_ms,
                m.error.as_deref().unwrap_or("ok")
            );
        }
        return;
    }

    use comfy_table::{Cell, Table};
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Provider", "Latency (ms)", "Results", "Status"]);
    for m in metrics {
        table.add_row(vec![
            Cell::new(m.provider.name()),
            Cell::new(m.latency_ms),
            Cell::new(m.result_count),
            Cell::new(m.error.as_deref().unwrap_or("ok")),
        ]);
    }
    println!("{table}");
}

fn output_providers(discovery: &Discovery, format: OutputFormat) -> Result<()> {
    let matrix = CapabilityMatrix::standard();
    let registry = discovery.registry();

    if format == OutputFormat::Json {
        let rows: Vec<_> = matrix
            .iter()
            .map(|(provider, cap)| {
                serde_json::json!({
                    "provider": provider,
                    "name": provider.name(),
                    "coverage": cap.coverage,
                    "citations": cap.supports_citations(),
                    "trending": cap.supports_trending(),
                    "open_access_rate": cap.open_access_rate,
                    "requires_credential": cap.requires_credential,
                    "requests_per_second": cap.requests_per_second,
                    "available": registry.get(provider).is_some_and(|p| p.is_available()),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    use comfy_table::{Cell, Table};
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec![
        "Provider",
        "Coverage",
        "Citations",
        "Trending",
        "Open access",
        "Rate (req/s)",
        "Available",
    ]);
    for (provider, cap) in matrix.iter() {
        let available = registry.get(provider).is_some_and(|p| p.is_available());
        table.add_row(vec![
            Cell::new(provider.id()),
            Cell::new(cap.coverage),
            Cell::new(yes_no(cap.supports_citations())),
            Cell::new(yes_no(cap.supports_trending())),
            Cell::new(format!("{:.0}%", cap.open_access_rate * 100.0)),
            Cell::new(cap.requests_per_second),
            Cell::new(if available {
                "yes".to_string()
            } else if cap.requires_credential {
                "no (credential required)".to_string()
            } else {
                "no".to_string()
            }),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}
