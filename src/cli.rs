use crate::config::{Config, LayoutAlgorithm, load_config};
use crate::dump::write_chart_dump;
use crate::layout::compute_layout;
use crate::model::Snapshot;
use crate::resolve::resolve_snapshot;
use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{Level, info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "orgchart",
    version,
    about = "Lay out an org chart from people and department snapshots"
)]
pub struct Args {
    /// Combined snapshot ({"people": [...], "departments": [...]}) or '-' for stdin
    #[arg(short = 'i', long = "input", conflicts_with_all = ["users", "departments"])]
    pub input: Option<PathBuf>,

    /// Body of the users listing endpoint
    #[arg(long = "users", requires = "departments")]
    pub users: Option<PathBuf>,

    /// Body of the departments listing endpoint
    #[arg(long = "departments", requires = "users")]
    pub departments: Option<PathBuf>,

    /// Output file. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config file (JSON or JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Layering strategy
    #[arg(short = 'a', long = "algorithm", value_enum)]
    pub algorithm: Option<LayoutAlgorithm>,

    /// Width of every node
    #[arg(long = "nodeWidth")]
    pub node_width: Option<f32>,

    /// Height of every node
    #[arg(long = "nodeHeight")]
    pub node_height: Option<f32>,

    /// Vertical gap between ranks
    #[arg(long = "rankSep")]
    pub rank_sep: Option<f32>,

    /// Horizontal gap between siblings
    #[arg(long = "nodeSep")]
    pub node_sep: Option<f32>,

    /// Pretty-print the JSON output
    #[arg(long = "pretty")]
    pub pretty: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args);

    let mut config = load_config(args.config.as_deref()).context("failed to load config")?;
    apply_overrides(&mut config, &args)?;

    let snapshot = read_snapshot(&args)?;
    for issue in snapshot.issues() {
        warn!(%issue, "snapshot issue");
    }

    let graph = resolve_snapshot(&snapshot);
    let layout = compute_layout(&graph, &config.layout);
    info!(
        people = snapshot.people.len(),
        departments = snapshot.departments.len(),
        edges = layout.edges.len(),
        algorithm = ?layout.algorithm,
        "laid out org chart"
    );

    write_chart_dump(&layout, &config.theme, args.output.as_deref(), args.pretty)
}

fn init_tracing(args: &Args) {
    let level = if args.quiet {
        Level::ERROR
    } else {
        match args.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn apply_overrides(config: &mut Config, args: &Args) -> Result<()> {
    let layout = &mut config.layout;
    if let Some(algorithm) = args.algorithm {
        layout.algorithm = algorithm;
    }
    if let Some(width) = args.node_width {
        ensure_positive("nodeWidth", width)?;
        layout.person_width = width;
        layout.department_width = width;
    }
    if let Some(height) = args.node_height {
        ensure_positive("nodeHeight", height)?;
        layout.person_height = height;
        layout.department_height = height;
    }
    if let Some(sep) = args.rank_sep {
        ensure_non_negative("rankSep", sep)?;
        layout.rank_spacing = sep;
    }
    if let Some(sep) = args.node_sep {
        ensure_non_negative("nodeSep", sep)?;
        layout.node_spacing = sep;
    }
    Ok(())
}

fn ensure_positive(name: &str, value: f32) -> Result<()> {
    if !(value.is_finite() && value > 0.0) {
        anyhow::bail!("--{name} must be a positive number, got {value}");
    }
    Ok(())
}

fn ensure_non_negative(name: &str, value: f32) -> Result<()> {
    if !(value.is_finite() && value >= 0.0) {
        anyhow::bail!("--{name} must be zero or positive, got {value}");
    }
    Ok(())
}

fn read_snapshot(args: &Args) -> Result<Snapshot> {
    if let (Some(users), Some(departments)) = (&args.users, &args.departments) {
        let users_body = read_file(users)?;
        let departments_body = read_file(departments)?;
        return Ok(Snapshot::from_endpoint_dumps(&users_body, &departments_body)?);
    }

    match args.input.as_deref() {
        Some(path) if path != Path::new("-") => Ok(Snapshot::from_json_str(&read_file(path)?)?),
        _ => Ok(Snapshot::from_reader(io::stdin().lock())?),
    }
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
