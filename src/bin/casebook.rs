//! Command-line access to the case corpus.
//!
//! Loads the corpus (a directory of case files, or a JSON/NDJSON stream on
//! stdin), then lints it or answers one query. Query output is JSON on stdout;
//! logs go to stderr and are filtered by `CASEBOOK_LOG`.

use anyhow::{Context, Result, anyhow, bail};
use casebook::{
    CaseFilter, CaseLoader, CaseRepository, Difficulty, RawCandidate, RepositoryError, Settings,
    parse_case_stream, read_corpus_dir, telemetry,
};
use serde::Serialize;
use serde_json::json;
use std::env;
use std::io::{self, Read};
use std::path::PathBuf;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse_from(env::args().skip(1))?;
    let mut settings = Settings::from_env()?;
    if let Some(schema) = &cli.schema {
        settings.schema_path = Some(schema.clone());
    }
    telemetry::init(settings.log_format)?;

    let candidates = read_candidates(&cli.source, &settings)?;
    let loader = settings.loader()?;
    match cli.command {
        CommandKind::Lint => lint(&loader, candidates),
        CommandKind::Query(query) => answer(CaseRepository::new(loader), candidates, &query),
    }
}

fn lint(loader: &CaseLoader, candidates: Vec<RawCandidate>) -> Result<()> {
    let result = loader.load_all(candidates);
    println!("{}", result.summary_line());
    for error in &result.errors {
        println!("error: {error}");
    }
    for warning in &result.warnings {
        println!("warning: {warning}");
    }
    if !result.errors.is_empty() || result.records.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

fn answer(repo: CaseRepository, candidates: Vec<RawCandidate>, query: &Query) -> Result<()> {
    let snapshot = repo.initialize(candidates).map_err(|err| match err {
        RepositoryError::Initialization(init) => {
            let details = init
                .diagnostics
                .iter()
                .map(|diag| format!("  {diag}"))
                .collect::<Vec<_>>()
                .join("\n");
            anyhow!("{init}\n{details}")
        }
        other => anyhow!(other),
    })?;
    if !snapshot.errors().is_empty() {
        eprintln!("{} (run `casebook lint` for details)", snapshot.summary_line());
    }

    match query {
        Query::List(filter) => print_json(&snapshot.list_cases(filter)),
        Query::Get(id) => {
            let record = snapshot.get_case(id)?;
            print_json(&*record)
        }
        Query::Search(term) => print_json(&snapshot.search_cases(term)),
        Query::Stats => print_json(&json!({
            "status": repo.status(),
            "stats": snapshot.stats(),
            "skipped": snapshot.errors().len(),
            "warnings": snapshot.warnings().len(),
        })),
    }
}

fn read_candidates(source: &InputSource, settings: &Settings) -> Result<Vec<RawCandidate>> {
    match source {
        InputSource::Stdin => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            parse_case_stream(&buf)
        }
        InputSource::Corpus(Some(dir)) => read_corpus_dir(dir),
        InputSource::Corpus(None) => read_corpus_dir(&settings.resolve_corpus_dir()?),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Debug, PartialEq)]
enum InputSource {
    Corpus(Option<PathBuf>),
    Stdin,
}

#[derive(Debug, PartialEq)]
enum CommandKind {
    Lint,
    Query(Query),
}

#[derive(Debug, PartialEq)]
enum Query {
    List(CaseFilter),
    Get(String),
    Search(String),
    Stats,
}

#[derive(Debug)]
struct Cli {
    source: InputSource,
    schema: Option<PathBuf>,
    command: CommandKind,
}

impl Cli {
    fn parse_from(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut args = args.into_iter();
        let mut source: Option<InputSource> = None;
        let mut schema: Option<PathBuf> = None;

        let command_name = loop {
            let Some(arg) = args.next() else {
                usage(1);
            };
            match arg.as_str() {
                "--corpus" => {
                    let dir = next_value(&mut args, "--corpus")?;
                    if source.is_some() {
                        bail!("--corpus/--stdin may only be provided once");
                    }
                    source = Some(InputSource::Corpus(Some(PathBuf::from(dir))));
                }
                "--stdin" => {
                    if source.is_some() {
                        bail!("--corpus/--stdin may only be provided once");
                    }
                    source = Some(InputSource::Stdin);
                }
                "--schema" => {
                    schema = Some(PathBuf::from(next_value(&mut args, "--schema")?));
                }
                "--help" | "-h" => usage(0),
                flag if flag.starts_with('-') => bail!("unknown flag: {flag}"),
                command => break command.to_string(),
            }
        };

        let command = match command_name.as_str() {
            "lint" => {
                no_more_args(&mut args, "lint")?;
                CommandKind::Lint
            }
            "stats" => {
                no_more_args(&mut args, "stats")?;
                CommandKind::Query(Query::Stats)
            }
            "list" => {
                let mut filter = CaseFilter::default();
                while let Some(arg) = args.next() {
                    match arg.as_str() {
                        "--category" => {
                            filter.category = Some(next_value(&mut args, "--category")?);
                        }
                        "--difficulty" => {
                            let raw = next_value(&mut args, "--difficulty")?;
                            let difficulty = Difficulty::parse(&raw).ok_or_else(|| {
                                anyhow!(
                                    "unknown difficulty '{raw}' (expected junior|mid|senior|principal)"
                                )
                            })?;
                            filter.difficulty = Some(difficulty);
                        }
                        other => bail!("unknown list option: {other}"),
                    }
                }
                CommandKind::Query(Query::List(filter))
            }
            "get" => {
                let id = args
                    .next()
                    .ok_or_else(|| anyhow!("get requires a case id"))?;
                no_more_args(&mut args, "get")?;
                CommandKind::Query(Query::Get(id))
            }
            "search" => {
                let term = args.collect::<Vec<_>>().join(" ");
                if term.trim().is_empty() {
                    bail!("search requires a term");
                }
                CommandKind::Query(Query::Search(term))
            }
            other => bail!("unknown command: {other}"),
        };

        Ok(Cli {
            source: source.unwrap_or(InputSource::Corpus(None)),
            schema,
            command,
        })
    }
}

fn next_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next()
        .ok_or_else(|| anyhow!("missing value for {flag}"))
}

fn no_more_args(args: &mut impl Iterator<Item = String>, command: &str) -> Result<()> {
    match args.next() {
        Some(extra) => bail!("{command} takes no arguments (got '{extra}')"),
        None => Ok(()),
    }
}

fn usage(code: i32) -> ! {
    eprintln!(
        "Usage: casebook [--corpus DIR | --stdin] [--schema PATH] <command>\n\nCommands:\n  lint                                  Validate the corpus and report skipped entries.\n  list [--category C] [--difficulty D]  Print case summaries in corpus order.\n  get <id>                              Print one case in full.\n  search <term>                         Print summaries of cases matching the term.\n  stats                                 Print counts per category and difficulty.\n\nEnvironment:\n  CASEBOOK_ROOT, CASEBOOK_CORPUS, CASEBOOK_CASE_SCHEMA, CASEBOOK_EXTRA_CATEGORIES,\n  CASEBOOK_LOG (filter), CASEBOOK_LOG_FORMAT (compact|json)"
    );
    std::process::exit(code);
}
