use std::env;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use researchmatch::models::{ArticleSummary, ExpertSummary};
use researchmatch::toolkit::search::{analyze_expert_match, ExpertMatch};
use researchmatch::{
    ArticleSearch, ExpertSearch, OpenAlexClient, ResearchClient, ResearchMatchConfig,
    SearchTarget, StaticWorkSource, StructuredQuery, WorkSource,
};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

struct CliArgs {
    mode: SearchTarget,
    keywords: Option<String>,
    query_file: Option<PathBuf>,
    works_file: Option<PathBuf>,
    email: Option<String>,
    max_results: Option<usize>,
    min_works: Option<usize>,
    min_relevance: Option<f64>,
    secondary: Vec<String>,
    require_all: bool,
    config: Option<PathBuf>,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            mode: SearchTarget::Articles,
            keywords: None,
            query_file: None,
            works_file: None,
            email: None,
            max_results: None,
            min_works: None,
            min_relevance: None,
            secondary: Vec::new(),
            require_all: false,
            config: None,
        }
    }
}

fn flag_value(args: &[String], i: &mut usize, flag: &str) -> anyhow::Result<String> {
    *i += 1;
    args.get(*i)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("{} expects a value", flag))
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// `None` means `--help` was requested.
fn parse_args(args: &[String]) -> anyhow::Result<Option<CliArgs>> {
    let mut parsed = CliArgs::default();

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--mode" | "-m" => {
                let raw = flag_value(args, &mut i, flag)?;
                parsed.mode = SearchTarget::from_str(&raw)
                    .map_err(|_| anyhow::anyhow!("unknown mode {:?}, expected articles or experts", raw))?;
            }
            "--keywords" | "-k" => parsed.keywords = Some(flag_value(args, &mut i, flag)?),
            "--query-file" | "-q" => parsed.query_file = Some(PathBuf::from(flag_value(args, &mut i, flag)?)),
            "--works-file" | "-w" => parsed.works_file = Some(PathBuf::from(flag_value(args, &mut i, flag)?)),
            "--email" => parsed.email = Some(flag_value(args, &mut i, flag)?),
            "--max-results" | "-n" => parsed.max_results = Some(flag_value(args, &mut i, flag)?.parse()?),
            "--min-works" => parsed.min_works = Some(flag_value(args, &mut i, flag)?.parse()?),
            "--min-relevance" => parsed.min_relevance = Some(flag_value(args, &mut i, flag)?.parse()?),
            "--secondary" | "-s" => parsed.secondary = parse_list(&flag_value(args, &mut i, flag)?),
            "--require-all" => parsed.require_all = true,
            "--config" | "-c" => parsed.config = Some(PathBuf::from(flag_value(args, &mut i, flag)?)),
            "--help" | "-h" => return Ok(None),
            other => anyhow::bail!("unknown argument {:?} (see --help)", other),
        }
        i += 1;
    }

    Ok(Some(parsed))
}

fn print_help() {
    println!("researchmatch - rank publications and find experts for a research interest");
    println!();
    println!("USAGE:");
    println!("    researchmatch [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -m, --mode <articles|experts>   What to search for [default: articles]");
    println!("    -k, --keywords <a,b,...>        Comma separated search phrases");
    println!("    -q, --query-file <PATH>         Structured query JSON (a model reply is accepted)");
    println!("    -w, --works-file <PATH>         Read works from a JSON file instead of OpenAlex");
    println!("        --email <ADDRESS>           Contact address for the OpenAlex polite pool");
    println!("    -n, --max-results <N>           Maximum results to print");
    println!("        --min-works <N>             Minimum works per expert");
    println!("        --min-relevance <F>         Minimum article relevance in [0, 1]");
    println!("    -s, --secondary <x,y,...>       Secondary disciplines for multidisciplinary search");
    println!("        --require-all               Require every secondary discipline to match");
    println!("    -c, --config <PATH>             TOML configuration file");
    println!("    -h, --help                      Print this help");
    println!();
    println!("ENVIRONMENT:");
    println!("    RESEARCHMATCH_*                 Overrides any configuration key");
    println!("    RUST_LOG                        Log filter (logs go to stderr)");
}

fn read_query(args: &CliArgs) -> anyhow::Result<StructuredQuery> {
    if let Some(path) = &args.query_file {
        let text = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read query file {}: {}", path.display(), e))?;
        return Ok(StructuredQuery::from_model_reply(&text));
    }
    if let Some(keywords) = &args.keywords {
        return Ok(StructuredQuery::from_free_text(keywords));
    }
    anyhow::bail!("either --keywords or --query-file is required (see --help)")
}

fn primary_discipline(query: &StructuredQuery) -> Option<String> {
    query
        .research_areas
        .iter()
        .chain(query.search_keywords.iter())
        .find(|s| !s.trim().is_empty())
        .cloned()
}

/// Primary discipline for a multidisciplinary run, `None` for a plain search.
fn multidisciplinary_primary(args: &CliArgs, query: &StructuredQuery) -> anyhow::Result<Option<String>> {
    if args.secondary.is_empty() {
        return Ok(None);
    }
    match primary_discipline(query) {
        Some(primary) => Ok(Some(primary)),
        None => anyhow::bail!(
            "--secondary needs a primary discipline: give a research area or keyword"
        ),
    }
}

#[derive(Serialize)]
struct ExpertReport {
    #[serde(flatten)]
    expert: ExpertSummary,
    analysis: ExpertMatch,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Report {
    Articles(Vec<ArticleSummary>),
    Experts(Vec<ExpertReport>),
}

async fn run<S: WorkSource>(
    client: &ResearchClient<S>,
    args: &CliArgs,
    query: &StructuredQuery,
) -> anyhow::Result<Report> {
    let primary = multidisciplinary_primary(args, query)?;

    match args.mode {
        SearchTarget::Articles => {
            let articles = match &primary {
                Some(primary) => {
                    client
                        .search_multidisciplinary_articles(primary, &args.secondary, args.max_results, args.require_all)
                        .await?
                }
                None => {
                    let options = ArticleSearch {
                        max_results: args.max_results,
                        min_relevance: args.min_relevance,
                        ..Default::default()
                    };
                    client.search_articles(query, &options).await?
                }
            };
            Ok(Report::Articles(articles.iter().map(|a| a.to_summary()).collect()))
        }
        SearchTarget::Experts => {
            let experts = match &primary {
                Some(primary) => {
                    client
                        .search_multidisciplinary_experts(primary, &args.secondary, args.max_results, args.require_all)
                        .await?
                }
                None => {
                    let options = ExpertSearch {
                        max_results: args.max_results,
                        min_works: args.min_works,
                        ..Default::default()
                    };
                    client.search_experts(query, &options).await?
                }
            };
            Ok(Report::Experts(
                experts
                    .iter()
                    .map(|e| ExpertReport {
                        expert: e.to_summary(),
                        analysis: analyze_expert_match(e, query),
                    })
                    .collect(),
            ))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let argv: Vec<String> = env::args().collect();
    let Some(args) = parse_args(&argv)? else {
        print_help();
        return Ok(());
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("researchmatch=info".parse()?))
        .init();

    let mut config = ResearchMatchConfig::load(args.config.as_deref())?;
    if let Some(email) = &args.email {
        config.mailto = email.clone();
    }
    if let Some(min_relevance) = args.min_relevance {
        config.min_relevance = min_relevance;
    }
    config.validate()?;

    let query = read_query(&args)?;
    info!(
        "🔍 {} search: areas={:?} expertise={:?} keywords={:?}",
        <&'static str>::from(args.mode),
        query.research_areas,
        query.expertise,
        query.search_keywords
    );

    let report = match &args.works_file {
        Some(path) => {
            let source = Arc::new(StaticWorkSource::from_file(path)?);
            run(&ResearchClient::new(source, config), &args, &query).await?
        }
        None => {
            let source = Arc::new(OpenAlexClient::new(&config)?);
            run(&ResearchClient::new(source, config), &args, &query).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
