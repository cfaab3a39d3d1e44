//! `wsr` command-line tool

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use wsr_admin::WsadminSessionFactory;
use wsr_reconcile::{apply_catalog, Catalog, RunSummary, ToolConfig};

const LOG_ENV: &str = "WSR_LOG";

fn catalog_arg() -> Arg {
    Arg::new("catalog")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("YAML catalog of clusters and members")
}

fn reconcile_args(cmd: Command) -> Command {
    cmd.arg(catalog_arg())
        .arg(
            Arg::new("jobs")
                .long("jobs")
                .short('j')
                .default_value("1")
                .value_parser(value_parser!(usize))
                .help("Resources reconciled concurrently within a tier"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Print the run summary as JSON"),
        )
}

fn cli() -> Command {
    Command::new("wsr")
        .version(wsr_reconcile::VERSION)
        .about("Reconcile WebSphere clusters and cluster members through wsadmin")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Tool configuration file (default: $WSR_CONFIG, then ./wsr.toml)"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .global(true)
                .default_value("text")
                .value_parser(["text", "json"])
                .help("Log output format"),
        )
        .subcommand(
            Command::new("validate")
                .about("Validate a catalog without contacting wsadmin")
                .arg(catalog_arg()),
        )
        .subcommand(reconcile_args(
            Command::new("plan").about("Probe and print the commands a run would issue"),
        ))
        .subcommand(reconcile_args(
            Command::new("apply").about("Converge remote state to the catalog"),
        ))
}

fn init_tracing(format: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_summary(summary: &RunSummary, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        println!("{summary}");
    }
    Ok(())
}

fn reconcile(args: &ArgMatches, dry_run: bool) -> anyhow::Result<i32> {
    let config_path = args.get_one::<PathBuf>("config").map(PathBuf::as_path);
    let config = ToolConfig::discover(config_path).context("loading configuration")?;
    let catalog_path = args
        .get_one::<PathBuf>("catalog")
        .context("catalog path is required")?;
    let catalog = Catalog::load(catalog_path)?;
    let jobs = args.get_one::<usize>("jobs").copied().unwrap_or(1);

    let reconcile = config.reconcile.clone().with_dry_run(dry_run || config.reconcile.dry_run);
    let factory = WsadminSessionFactory::new(config.admin);
    let summary = apply_catalog(&catalog, &factory, &reconcile, jobs)?;

    print_summary(&summary, args.get_flag("json"))?;
    Ok(summary.exit_code())
}

fn run(matches: &ArgMatches) -> anyhow::Result<i32> {
    match matches.subcommand() {
        Some(("validate", args)) => {
            let path = args
                .get_one::<PathBuf>("catalog")
                .context("catalog path is required")?;
            let catalog = Catalog::load(path)?;
            for name in catalog.undeclared_clusters() {
                println!("warning: cluster {name} is referenced by members but not declared");
            }
            println!(
                "{}: {} clusters, {} members valid",
                path.display(),
                catalog.clusters.len(),
                catalog.members.len()
            );
            Ok(0)
        }
        Some(("plan", args)) => reconcile(args, true),
        Some(("apply", args)) => reconcile(args, false),
        _ => Ok(0),
    }
}

fn main() {
    let matches = cli().get_matches();
    let scoped = matches.subcommand().map_or(&matches, |(_, args)| args);
    let format = scoped
        .get_one::<String>("log-format")
        .map_or("text", String::as_str);
    init_tracing(format);

    let code = match run(&matches) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "wsr failed");
            eprintln!("error: {e:#}");
            1
        }
    };
    std::process::exit(code);
}
