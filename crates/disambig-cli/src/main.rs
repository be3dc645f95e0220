//! Command-line front end for the disambiguation index
//!
//! Loads a page fixture into an in-memory index and answers canonical-name,
//! conflict, near-match, listing and maintenance queries against it.

mod pages;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use disambig_core::{PageTitle, Tags};
use disambig_index::{
    CollisionIndex, DisambigConfig, MemoryBackend, NearMatch, PageDirectory, RelatedHeads,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn namespace_arg() -> Arg {
    Arg::new("namespace")
        .long("namespace")
        .short('n')
        .value_parser(value_parser!(i32))
        .help("Namespace id (default: taken from the title prefix)")
}

fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Output as JSON")
}

fn cli() -> Command {
    Command::new("disambig")
        .version(disambig_index::VERSION)
        .about("Title disambiguation index")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("pages")
                .long("pages")
                .short('p')
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("JSON page fixture to index"),
        )
        .subcommand(
            Command::new("resolve")
                .about("Canonical display name for a requested title")
                .arg(Arg::new("title").required(true).help("Requested title"))
                .arg(
                    Arg::new("tag")
                        .long("tag")
                        .short('t')
                        .action(ArgAction::Append)
                        .help("Requested tag, broadest first (repeatable)"),
                )
                .arg(namespace_arg()),
        )
        .subcommand(
            Command::new("report")
                .about("Naming conflicts among pages sharing a head")
                .arg(Arg::new("head").required(true).help("Colliding head"))
                .arg(namespace_arg())
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("near")
                .about("Main-namespace page for a search term")
                .arg(Arg::new("term").required(true).help("Search term"))
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("list")
                .about("Disambiguation listing for a head")
                .arg(Arg::new("head").required(true).help("Listed head"))
                .arg(namespace_arg())
                .arg(
                    Arg::new("current")
                        .long("current")
                        .value_parser(value_parser!(u64))
                        .help("Page id of the listing page itself"),
                )
                .arg(
                    Arg::new("relate")
                        .long("relate")
                        .short('r')
                        .action(ArgAction::Append)
                        .help("Related head as HEAD or HEAD=DESCRIPTION (repeatable)"),
                )
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("conflicts")
                .about("Every tagged head shared by several pages")
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("same-name")
                .about("Untagged pages whose titles differ only in case or spacing")
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("redirects")
                .about("Listings for redirects whose names other pages share")
                .arg(
                    Arg::new("target")
                        .required(true)
                        .value_parser(value_parser!(u64))
                        .help("Page id the redirects point at"),
                )
                .arg(json_arg()),
        )
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let matches = cli().get_matches();

    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => DisambigConfig::from_path(path)?,
        None => DisambigConfig::default(),
    };
    let pages_path = matches
        .get_one::<PathBuf>("pages")
        .context("--pages is required")?;

    let backend = Arc::new(MemoryBackend::new());
    let index = CollisionIndex::new(&config, backend.clone(), backend.clone())?;
    let fixture = pages::load_pages(pages_path)?;
    let stored = pages::populate(&backend, &index, &fixture, config.tag_separator)?;
    info!(pages = fixture.len(), stored, "index populated");

    match matches.subcommand() {
        Some(("resolve", args)) => run_resolve(&index, &config, args),
        Some(("report", args)) => run_report(&index, args),
        Some(("near", args)) => run_near(&index, args),
        Some(("list", args)) => run_list(&index, args),
        Some(("conflicts", args)) => run_conflicts(&index, args),
        Some(("same-name", args)) => run_same_name(&index, args),
        Some(("redirects", args)) => run_redirects(&index, args),
        _ => Ok(()),
    }
}

/// Namespace and text of a positional title, honouring `--namespace`
fn target(index: &CollisionIndex, args: &ArgMatches, name: &str) -> Result<(i32, String)> {
    let raw = args
        .get_one::<String>(name)
        .with_context(|| format!("missing <{name}>"))?;
    Ok(match args.get_one::<i32>("namespace") {
        Some(namespace) => (*namespace, raw.trim().to_string()),
        None => index.grammar().parse_prefixed(raw),
    })
}

fn run_resolve(index: &CollisionIndex, config: &DisambigConfig, args: &ArgMatches) -> Result<()> {
    let (namespace, text) = target(index, args, "title")?;
    let tags = Tags::try_new(
        args.get_many::<String>("tag").unwrap_or_default(),
        config.tag_separator,
    )?;

    let name = index.resolve(&PageTitle::new(namespace, text), &tags)?;
    println!("{name}");
    Ok(())
}

fn run_report(index: &CollisionIndex, args: &ArgMatches) -> Result<()> {
    let (namespace, head) = target(index, args, "head")?;
    let Some(report) = index.conflict_report(namespace, &head)? else {
        println!("No collision for {head}");
        return Ok(());
    };

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Conflict report: {} ({} pages)", report.head, report.entries.len());
    for entry in &report.entries {
        let status = if entry.unsolved {
            "UNSOLVED"
        } else if entry.needs_move {
            "MOVE"
        } else {
            "OK"
        };
        println!(
            "  [{status:>8}] #{} {} -> {}{}",
            entry.id,
            entry.current,
            entry.proposed,
            if entry.is_redirect { " (redirect)" } else { "" }
        );
    }
    Ok(())
}

fn run_near(index: &CollisionIndex, args: &ArgMatches) -> Result<()> {
    let term = args.get_one::<String>("term").context("missing <term>")?;
    let outcome = index.near_match(term)?;

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    match outcome {
        NearMatch::NoMatch => println!("No match"),
        NearMatch::Unique(page) => println!("{}", index.grammar().display(&page)),
        NearMatch::Ambiguous { head } => println!("Ambiguous: see listing for {head}"),
    }
    Ok(())
}

fn run_list(index: &CollisionIndex, args: &ArgMatches) -> Result<()> {
    let (namespace, head) = target(index, args, "head")?;
    let current = args.get_one::<u64>("current").copied();
    let related: RelatedHeads = args
        .get_many::<String>("relate")
        .unwrap_or_default()
        .map(|entry| match entry.split_once('=') {
            Some((head, description)) => (head.trim().to_string(), description.trim().to_string()),
            None => (entry.trim().to_string(), String::new()),
        })
        .collect();

    let rows = index.disambiguation_list(namespace, &head, current, &related)?;

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for row in &rows {
        match &row.label {
            Some(label) => println!("* {} - {label}", row.title),
            None => println!("* {}", row.title),
        }
    }
    Ok(())
}

fn run_conflicts(index: &CollisionIndex, args: &ArgMatches) -> Result<()> {
    let heads = index.conflicts()?;

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&heads)?);
        return Ok(());
    }

    for head in &heads {
        println!("{:>4}  [{}] {}", head.count, head.namespace, head.head);
    }
    Ok(())
}

fn run_same_name(index: &CollisionIndex, args: &ArgMatches) -> Result<()> {
    let groups = index.same_name_groups()?;

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&groups)?);
        return Ok(());
    }

    for group in &groups {
        let titles: Vec<String> = group
            .ids
            .iter()
            .filter_map(|id| index.pages().title(*id))
            .map(|page| index.grammar().display(&page))
            .collect();
        println!("{}: {}", group.search_key, titles.join(", "));
    }
    Ok(())
}

fn run_redirects(index: &CollisionIndex, args: &ArgMatches) -> Result<()> {
    let target = *args.get_one::<u64>("target").context("missing <target>")?;
    let listings = index.redirect_listings(target)?;

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&listings)?);
        return Ok(());
    }

    for listing in &listings {
        println!("{} may also refer to:", listing.title);
        for row in &listing.entries {
            match &row.label {
                Some(label) => println!("* {} - {label}", row.title),
                None => println!("* {}", row.title),
            }
        }
    }
    Ok(())
}
