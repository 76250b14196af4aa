mod core;
mod http;
mod text;
mod ticker;

use std::path::{Path, PathBuf};

use airing_proto::clock::TimeResolver;
use airing_proto::config::Config;
use airing_proto::lookup::EmbedPolicy;
use airing_proto::platform::SIMULATED_TIME_ENV;
use airing_proto::render::RenderFrame;
use airing_proto::scheduler::HourlyScheduler;
use airing_proto::session::{evaluate_at, SessionState};
use airing_proto::state::StateManager;
use airing_proto::timetable::{self, TimetableSource};
use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug, Clone)]
pub enum BroadcastMessage {
    StateUpdated,
    Log(String),
}

/// A custom tracing layer that forwards log messages to the broadcast channel
struct BroadcastLayer {
    sender: broadcast::Sender<BroadcastMessage>,
}

impl BroadcastLayer {
    fn new(sender: broadcast::Sender<BroadcastMessage>) -> Self {
        Self { sender }
    }
}

impl<S> tracing_subscriber::Layer<S> for BroadcastLayer
where
    S: tracing::Subscriber,
{
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        // Only WARN and ERROR reach clients
        let level = event.metadata().level();
        if !matches!(*level, tracing::Level::WARN | tracing::Level::ERROR) {
            return;
        }

        let mut message = format!("{} [{}] ", chrono::Local::now().format("%H:%M:%S"), level);
        let mut visitor = MessageVisitor(&mut message);
        event.record(&mut visitor);

        // No receivers is fine
        let _ = self.sender.send(BroadcastMessage::Log(message));
    }
}

struct MessageVisitor<'a>(&'a mut String);

impl<'a> tracing::field::Visit for MessageVisitor<'a> {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0.push_str(&format!("{:?}", value));
        } else {
            self.0.push_str(&format!(" {}={:?}", field.name(), value));
        }
    }
}

const DEFAULT_FILTER: &str = "info,airing_daemon=debug,airing_proto=debug,hyper=warn,reqwest=warn";

#[derive(Parser, Debug)]
#[command(name = "airing", version, about = "What's on air now, from a weekly timetable")]
struct Cli {
    /// Config file (default: <config dir>/airing/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Timetable file or http(s) URL, overrides [timetable] source
    #[arg(long, global = true)]
    timetable: Option<String>,

    /// Simulated wall-clock time as HHMM; disables hourly re-evaluation
    #[arg(long, global = true, value_name = "HHMM")]
    time: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the guide daemon (default)
    Serve,
    /// Evaluate once and print what is on air
    Now {
        /// Always print the week grid
        #[arg(long)]
        grid: bool,
    },
    /// Generate the timetable JSON from the two CSV sheets
    Build {
        /// channel,url sheet
        #[arg(long)]
        urls: PathBuf,
        /// start_time,day_category,program_name,channels sheet
        #[arg(long)]
        table: PathBuf,
        /// Output JSON path
        #[arg(long, default_value = "schedule.json")]
        out: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Build { ref urls, ref table, ref out }) => {
            init_stderr_logging();
            build(urls, table, out)
        }
        Some(Commands::Now { grid }) => {
            init_stderr_logging();
            let config = load_config(cli.config.as_deref())?;
            now(&cli, &config, grid).await
        }
        Some(Commands::Serve) | None => {
            let config = load_config(cli.config.as_deref())?;
            serve(&cli, config).await
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Config::load(),
    }
}

fn timetable_source(cli: &Cli, config: &Config) -> TimetableSource {
    TimetableSource::parse(cli.timetable.as_deref().unwrap_or(&config.timetable.source))
}

/// `--time` wins over the environment variable.
fn time_resolver(cli: &Cli) -> TimeResolver {
    let param = cli
        .time
        .clone()
        .or_else(|| std::env::var(SIMULATED_TIME_ENV).ok());
    TimeResolver::from_param(param.as_deref())
}

fn init_stderr_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();
}

fn init_file_logging(
    log_path: &Path,
    broadcast_tx: broadcast::Sender<BroadcastMessage>,
) -> anyhow::Result<()> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("opening log file {}", log_path.display()))?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(BroadcastLayer::new(broadcast_tx))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_FILTER)),
        )
        .init();
    Ok(())
}

fn build(urls: &Path, table: &Path, out: &Path) -> anyhow::Result<()> {
    let report = airing_proto::builder::build_files(urls, table, out)?;
    println!(
        "Wrote {} ({} programs, {} airing slots)",
        out.display(),
        report.programs,
        report.schedule.airing_slots()
    );
    for skipped in &report.skipped {
        eprintln!("skipped {}", skipped);
    }
    Ok(())
}

async fn now(cli: &Cli, config: &Config, grid: bool) -> anyhow::Result<()> {
    let resolver = time_resolver(cli);
    let source = timetable_source(cli, config);
    let schedule = match timetable::load(&source).await {
        Ok(schedule) => schedule,
        Err(e) => {
            error!("Timetable load from {} failed: {}", source.describe(), e);
            let manager = StateManager::new(None);
            manager
                .set_failed(format!("Unable to load the timetable: {}", e))
                .await;
            print!("{}", text::paint_state(&manager.get_state().await));
            return Ok(());
        }
    };

    let (_, plan) = evaluate_at(
        &schedule,
        &resolver,
        &chrono::Local::now(),
        SessionState::new(),
    );
    let plan = plan.context("first evaluation produced no plan")?;
    let policy = EmbedPolicy::new(
        config.policy.external_only_channels.iter().cloned(),
        config.policy.autoplay,
    );
    let frame = RenderFrame::build(&plan, &schedule, &policy);

    print!("{}", text::paint_frame(&frame));
    if grid && !frame.schedule_visible {
        print!("{}", text::paint_grid(&frame.grid));
    }
    Ok(())
}

async fn serve(cli: &Cli, config: Config) -> anyhow::Result<()> {
    // Broadcast channel first so the logging layer can use it
    let (broadcast_tx, _) = broadcast::channel::<BroadcastMessage>(100);
    init_file_logging(&config.daemon.log_file, broadcast_tx.clone())?;

    info!("Log file: {:?}", config.daemon.log_file);
    info!("Config loaded from: {:?}", cli.config.clone().unwrap_or_else(Config::config_path));

    let resolver = time_resolver(cli);
    let source = timetable_source(cli, &config);

    // Event channel: every external input funnels into GuideCore
    let (event_tx, event_rx) = mpsc::channel::<core::GuideEvent>(256);

    let guide_core = core::GuideCore::new(&config, &source, resolver, broadcast_tx.clone()).await;
    let state_manager = guide_core.state_manager();

    if config.http.enabled {
        let _http_handle = http::start_server(
            config.http.bind_address.clone(),
            config.http.port,
            state_manager,
            event_tx.clone(),
            broadcast_tx.clone(),
        );
    }

    let mut ticker = ticker::TokioScheduler::new(event_tx.clone());
    HourlyScheduler::from(&config.scheduler).start(
        chrono::Local::now(),
        resolver.is_simulated(),
        &mut ticker,
    );

    let shutdown_tx = event_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(core::GuideEvent::Shutdown).await;
        }
    });
    drop(event_tx);

    info!("Guide initialised, running event loop");
    guide_core.run(event_rx).await?;

    Ok(())
}
