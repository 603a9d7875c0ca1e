use clap::Parser;
use eoka_probe::{
    run_discovery, EokaSession, FsPersister, ProbeConfig, Report, ScenarioAdapter, StopPolicy,
    TemplateWriter,
};
use std::path::PathBuf;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "eoka-probe")]
#[command(about = "Find hover menus and popups on a page and write Gherkin features for them")]
#[command(version)]
struct Cli {
    /// Page to probe
    url: String,

    /// YAML config file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Show the browser window (overrides config)
    #[arg(long)]
    headed: bool,

    /// Directory for feature files (overrides config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Stop each probe pass at its first finding
    #[arg(long)]
    first_match: bool,

    /// Fall back to structural diffs when a hover reveals no new links
    #[arg(long)]
    structural: bool,

    /// Print findings as JSON instead of writing feature files
    #[arg(long)]
    no_write: bool,

    /// Verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Validate config without running
    #[arg(long)]
    check: bool,

    /// Quiet mode (only errors)
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> eoka_probe::Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    let mut config = match cli.config {
        Some(ref path) => ProbeConfig::load(path)?,
        None => ProbeConfig::default(),
    };
    if cli.headed {
        config.browser.headless = false;
    }
    if let Some(ref dir) = cli.output {
        config.output.dir = dir.display().to_string();
    }
    if cli.first_match {
        config.limits.stop_policy = StopPolicy::FirstMatch;
    }
    if cli.structural {
        config.heuristics.diff.structural_fallback = true;
    }
    config.validate()?;

    if cli.check {
        let l = &config.limits;
        println!("Config valid");
        println!("  Target: {}", cli.url);
        println!(
            "  Hover: {} candidates, {} findings",
            l.max_hover_candidates, l.max_hover_findings
        );
        println!(
            "  Click: {} candidates, {} findings",
            l.max_click_candidates, l.max_popup_findings
        );
        println!("  Stop policy: {}", l.stop_policy);
        println!("  Output: {}", config.output.dir);
        return Ok(());
    }

    let mut session = EokaSession::new(&config);
    let discovery = match run_discovery(&cli.url, &mut session, &config).await {
        Ok(d) => d,
        Err(e) => {
            error!("{}", e);
            println!("{}", serde_json::to_string_pretty(&Report::failure(&e))?);
            std::process::exit(1);
        }
    };
    info!(
        "probed {} hover and {} click candidates",
        discovery.stats.hover.probed, discovery.stats.click.probed
    );

    if cli.no_write {
        println!("{}", serde_json::to_string_pretty(&discovery)?);
        return Ok(());
    }

    let groups = ScenarioAdapter::new(&TemplateWriter, &config.output.scenario_marker)
        .adapt(&cli.url, &discovery)
        .await;
    let persister = FsPersister::new(&config.output.dir);
    let report = Report::publish(&cli.url, &groups, &persister)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
