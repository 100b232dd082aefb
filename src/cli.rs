//! Command-line front end.

use crate::offline::{CacheManifest, CacheStorage, DiskCache, ResponseSource, ServiceWorker};
use crate::query::{IconicTaxon, RankLevel, SearchFilter};
use crate::session::SearchStatus;
use crate::{Explorer, ExplorerConfig, ResultsView};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::AsyncBufReadExt;

#[cfg(feature = "postcard")]
use crate::postcard::PostcardStyle;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)] // Read from `Cargo.toml`
#[command(arg_required_else_help = true, disable_help_subcommand = true)]
pub struct Args {
    /// Verbosity level (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// API root (default https://api.inaturalist.org/v1)
    #[arg(long, value_name = "URL", global = true)]
    pub api_base: Option<String>,

    /// User agent sent with every request
    #[arg(long, value_name = "UA", global = true)]
    pub user_agent: Option<String>,

    /// Minimum milliseconds between two API requests
    #[arg(long, value_name = "MS", global = true)]
    pub min_interval_ms: Option<u64>,

    /// Request timeout in milliseconds
    #[arg(long, value_name = "MS", global = true)]
    pub timeout_ms: Option<u64>,

    /// Render every response, even ones overtaken by a newer search
    #[arg(long, global = true)]
    pub keep_stale_responses: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Rank level: a number (10 = species) or a name (species, genus, family, ...)
    #[arg(long, value_name = "RANK")]
    pub rank: Option<RankLevel>,

    /// Iconic taxon category, repeatable or comma separated (Aves, Plantae, ...)
    #[arg(long = "iconic", value_name = "TAXON", value_delimiter = ',')]
    pub iconic: Vec<IconicTaxon>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> SearchFilter {
        SearchFilter {
            rank_level: self.rank,
            iconic_taxa: self.iconic.clone(),
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Html,
    Json,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Search taxa by name and print the results
    Search {
        /// Name to search for
        #[arg(value_name = "TERM")]
        term: String,

        #[command(flatten)]
        filter: FilterArgs,

        /// Number of pages to load
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        pages: u32,

        /// Include results of any quality grade
        #[arg(long)]
        any_grade: bool,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Interactive search: type a name, then :more, :postcard N, :quit
    Explore {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Search and export the postcard for one result
    Postcard(PostcardArgs),

    /// Offline asset cache
    Offline {
        #[command(subcommand)]
        command: OfflineCommand,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct PostcardArgs {
    #[arg(value_name = "TERM")]
    pub term: String,

    /// 1-based result number on the first page
    #[arg(long, default_value_t = 1)]
    pub index: usize,

    /// Directory the PNG is written to
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub out: PathBuf,

    /// File name style
    #[cfg(feature = "postcard")]
    #[arg(long, value_enum, default_value_t = PostcardStyle::Postcard)]
    pub style: PostcardStyle,

    /// Skip the drop shadow under the photo
    #[arg(long)]
    pub no_shadow: bool,

    /// Add the category label under the scientific name
    #[arg(long)]
    pub category: bool,

    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Subcommand, Debug, Clone)]
pub enum OfflineCommand {
    /// Fetch the asset manifest from BASE_URL into the cache
    Install {
        #[arg(long, value_name = "BASE_URL")]
        base_url: String,

        #[command(flatten)]
        cache: CacheArgs,
    },

    /// Serve a URL cache-first
    Fetch {
        #[arg(value_name = "URL")]
        url: String,

        /// Base URL relative requests are resolved against
        #[arg(long, value_name = "BASE_URL")]
        base_url: Option<String>,

        /// Write the body here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,

        #[command(flatten)]
        cache: CacheArgs,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct CacheArgs {
    /// Root directory for caches
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Cache name; change it to start a fresh cache
    #[arg(long, default_value = crate::offline::DEFAULT_CACHE_NAME)]
    pub cache_name: String,
}

impl Args {
    /// Defaults overridden by whatever flags were given.
    pub fn config(&self) -> ExplorerConfig {
        let mut config = ExplorerConfig::default();
        if let Some(base) = &self.api_base {
            config.api_base_url = base.clone();
        }
        if let Some(ua) = &self.user_agent {
            config.user_agent = ua.clone();
        }
        if let Some(ms) = self.min_interval_ms {
            config.min_request_interval_ms = ms;
        }
        if let Some(ms) = self.timeout_ms {
            config.timeout_ms = ms;
        }
        if self.keep_stale_responses {
            config.discard_stale_responses = false;
        }
        config
    }
}

pub async fn run(args: Args) -> Result<()> {
    log::debug!("starting with {:?}", args);
    let mut config = args.config();

    match args.command {
        Command::Search {
            term,
            filter,
            pages,
            any_grade,
            format,
        } => {
            config.research_grade_only = !any_grade;
            run_search(config, &term, filter.to_filter(), pages, format).await
        }
        Command::Explore { filter } => run_explore(config, filter.to_filter()).await,
        Command::Postcard(postcard) => run_postcard(config, postcard).await,
        Command::Offline { command } => run_offline(config, command).await,
    }
}

fn print_view(view: &ResultsView, format: OutputFormat) -> Result<()> {
    let rendered = match format {
        OutputFormat::Text => view.render_text(),
        OutputFormat::Html => view.render_html(),
        OutputFormat::Json => view.to_json().context("serializing results")?,
    };
    print!("{}", rendered);
    Ok(())
}

async fn run_search(
    config: ExplorerConfig,
    term: &str,
    filter: SearchFilter,
    pages: u32,
    format: OutputFormat,
) -> Result<()> {
    let mut explorer = Explorer::new(config).context("configuring explorer")?;

    if explorer.search(term, filter).await.is_none() {
        log::warn!("empty search term, nothing to do");
        return Ok(());
    }
    for _ in 1..pages {
        if !explorer.view().load_more_visible() || is_error(explorer.session().status()) {
            break;
        }
        explorer.load_more().await;
    }

    print_view(explorer.view(), format)?;
    if let SearchStatus::Error(message) = explorer.session().status() {
        bail!("search failed: {}", message);
    }
    Ok(())
}

fn is_error(status: &SearchStatus) -> bool {
    matches!(status, SearchStatus::Error(_))
}

#[cfg(feature = "postcard")]
async fn run_postcard(mut config: ExplorerConfig, args: PostcardArgs) -> Result<()> {
    if args.index == 0 {
        bail!("result numbers start at 1");
    }
    config.postcard.style = args.style;
    config.postcard.shadow = !args.no_shadow;
    config.postcard.show_category = args.category;

    let mut explorer = Explorer::new(config).context("configuring explorer")?;
    if explorer.search(&args.term, args.filter.to_filter()).await.is_none() {
        bail!("empty search term");
    }
    if let SearchStatus::Error(message) = explorer.session().status() {
        bail!("search failed: {}", message);
    }

    let postcard = explorer.postcard(args.index - 1).await?;
    let path = postcard.save_in(&args.out)?;
    println!("{}", path.display());
    Ok(())
}

#[cfg(not(feature = "postcard"))]
async fn run_postcard(_config: ExplorerConfig, _args: PostcardArgs) -> Result<()> {
    bail!("postcards are not available in this build")
}

/// One line of input in `explore`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Search(String),
    More,
    /// 1-based card number and optional output directory
    Postcard(usize, Option<PathBuf>),
    Rank(Option<RankLevel>),
    Iconic(Vec<IconicTaxon>),
    Show,
    Help,
    Quit,
    Empty,
}

pub fn parse_repl_line(line: &str) -> std::result::Result<ReplCommand, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ReplCommand::Empty);
    }
    let Some(rest) = line.strip_prefix(':') else {
        return Ok(ReplCommand::Search(line.to_string()));
    };

    let mut parts = rest.split_whitespace();
    let cmd = parts.next().unwrap_or_default();
    let arg = parts.next();
    match cmd {
        "more" | "m" => Ok(ReplCommand::More),
        "postcard" | "p" => {
            let n = arg
                .ok_or("usage: :postcard N [DIR]")?
                .parse::<usize>()
                .map_err(|e| format!("bad result number: {}", e))?;
            if n == 0 {
                return Err("result numbers start at 1".into());
            }
            Ok(ReplCommand::Postcard(n, parts.next().map(PathBuf::from)))
        }
        "rank" => match arg {
            None => Ok(ReplCommand::Rank(None)),
            Some(r) => r
                .parse::<RankLevel>()
                .map(|level| ReplCommand::Rank(Some(level).filter(|l| l.is_filter())))
                .map_err(|e| e.to_string()),
        },
        "iconic" => arg
            .unwrap_or_default()
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.parse::<IconicTaxon>().map_err(|e| e.to_string()))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(ReplCommand::Iconic),
        "show" | "s" => Ok(ReplCommand::Show),
        "help" | "h" | "?" => Ok(ReplCommand::Help),
        "quit" | "q" | "exit" => Ok(ReplCommand::Quit),
        other => Err(format!("unknown command ':{}' (try :help)", other)),
    }
}

const REPL_HELP: &str = "\
Type a name to search. Commands:
  :more              load the next page
  :postcard N [DIR]  export result N as a PNG
  :rank R            filter by rank (species, genus, 20, any)
  :iconic A,B        filter by category (Aves, Plantae, ...)
  :show              print the current results
  :quit              leave";

async fn run_explore(config: ExplorerConfig, mut filter: SearchFilter) -> Result<()> {
    let mut explorer = Explorer::new(config).context("configuring explorer")?;
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    println!("{}", REPL_HELP);

    loop {
        print!("search> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let cmd = match parse_repl_line(&line) {
            Ok(cmd) => cmd,
            Err(msg) => {
                eprintln!("{}", msg);
                continue;
            }
        };

        match cmd {
            ReplCommand::Empty => {}
            ReplCommand::Quit => break,
            ReplCommand::Help => println!("{}", REPL_HELP),
            ReplCommand::Show => print!("{}", explorer.view().render_text()),
            ReplCommand::Rank(level) => {
                filter.rank_level = level;
                explorer.session_mut().set_filter(filter.clone());
                println!("rank filter: {}", level.map(|l| l.to_string()).unwrap_or_else(|| "any".into()));
            }
            ReplCommand::Iconic(taxa) => {
                filter.iconic_taxa = taxa;
                explorer.session_mut().set_filter(filter.clone());
                println!("category filter: {:?}", filter.iconic_taxa);
            }
            ReplCommand::Search(term) => {
                explorer.search(&term, filter.clone()).await;
                print!("{}", explorer.view().render_text());
            }
            ReplCommand::More => {
                if !explorer.view().load_more_visible() {
                    println!("no more results");
                    continue;
                }
                explorer.load_more().await;
                print!("{}", explorer.view().render_text());
            }
            ReplCommand::Postcard(n, dir) => {
                export_postcard(&explorer, n, dir.as_deref()).await;
            }
        }
    }
    Ok(())
}

#[cfg(feature = "postcard")]
async fn export_postcard(explorer: &Explorer, n: usize, dir: Option<&Path>) {
    let dir = dir.unwrap_or_else(|| Path::new("."));
    match explorer.postcard(n - 1).await {
        Ok(card) => match card.save_in(dir) {
            Ok(path) => println!("saved {}", path.display()),
            Err(e) => eprintln!("could not save postcard: {}", e),
        },
        // failures are reported and the session carries on
        Err(e) => eprintln!("{}", e),
    }
}

#[cfg(not(feature = "postcard"))]
async fn export_postcard(_explorer: &Explorer, _n: usize, _dir: Option<&Path>) {
    eprintln!("postcards are not available in this build");
}

fn open_cache(config: &ExplorerConfig, args: &CacheArgs) -> Result<DiskCache> {
    let root = args.cache_dir.clone().unwrap_or_else(|| config.cache_dir.clone());
    DiskCache::open(&root, &args.cache_name)
        .with_context(|| format!("opening cache '{}' under {}", args.cache_name, root.display()))
}

async fn run_offline(config: ExplorerConfig, command: OfflineCommand) -> Result<()> {
    config.validate()?;
    let http = crate::api::build_http_client(&config)?;

    match command {
        OfflineCommand::Install { base_url, cache } => {
            let storage = open_cache(&config, &cache)?;
            let scope = url::Url::parse(&base_url).with_context(|| format!("parsing {}", base_url))?;
            let worker = ServiceWorker::new(storage, http, scope);
            let manifest = CacheManifest::with_name(cache.cache_name.clone());
            let count = worker.install(&manifest).await?;
            println!(
                "cached {} asset(s) in '{}' ({})",
                count,
                worker.storage().name(),
                worker.storage().dir().display()
            );
            Ok(())
        }
        OfflineCommand::Fetch {
            url,
            base_url,
            out,
            cache,
        } => {
            let storage = open_cache(&config, &cache)?;
            let scope_src = base_url.as_deref().unwrap_or(&url);
            let scope = url::Url::parse(scope_src).with_context(|| format!("parsing {}", scope_src))?;
            let worker = ServiceWorker::new(storage, http, scope);
            let res = worker.fetch_url(&url).await?;
            let source = match res.source {
                ResponseSource::Cache => "cache",
                ResponseSource::Network => "network",
            };
            log::info!("{} served from {} ({})", res.response.url, source, res.response.status);
            match out {
                Some(path) => {
                    std::fs::write(&path, &res.response.body)
                        .with_context(|| format!("writing {}", path.display()))?;
                    eprintln!("{} bytes from {} -> {}", res.response.body.len(), source, path.display());
                }
                None => std::io::stdout().write_all(&res.response.body)?,
            }
            Ok(())
        }
    }
}
