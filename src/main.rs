use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event as TermEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use meshwatch::config::{Overrides, Settings};
use meshwatch::refresh::{Event, Scheduler};
use meshwatch::ui::{self, Theme};
use meshwatch::{
    events, ApiGateway, App, ConnectionTracker, Dashboard, ExportRange, PushStream,
    TelemetrySource, WindowSelection,
};

#[derive(Parser, Debug)]
#[command(name = "meshwatch")]
#[command(about = "Live dashboard for environmental sensor mesh telemetry")]
struct Args {
    /// Backend base URL (e.g., http://localhost:5000)
    #[arg(short, long, env = "MESHWATCH_BASE_URL")]
    base_url: Option<String>,

    /// Path to a TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Initial time window in hours
    #[arg(short, long)]
    window: Option<u32>,

    /// Log dashboard updates to stderr instead of drawing the TUI
    #[arg(long)]
    headless: bool,

    /// Log file used while the TUI owns the terminal
    #[arg(long, default_value = "meshwatch.log")]
    log_file: PathBuf,

    /// Export the initial window as CSV to this path and exit
    #[arg(short, long, conflicts_with = "headless")]
    export: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let overrides = Overrides {
        base_url: args.base_url.clone(),
        window_hours: args.window,
    };
    let settings = Settings::load(args.config.as_deref(), &overrides)?;

    init_logging(&args)?;
    info!("Using backend {}", settings.base_url);

    let rt = Runtime::new()?;
    let tracker = Arc::new(ConnectionTracker::new());
    let gateway = ApiGateway::builder()
        .base_url(settings.base_url.clone())
        .timeout(settings.request_timeout()?)
        .tracker(tracker.clone())
        .build()?;

    // Connection state starts from a real health check rather than the default.
    match rt.block_on(gateway.health()) {
        Some(health) => info!("Backend status: {}", health.status),
        None => warn!("Backend {} is not reachable yet", gateway.base_url()),
    }

    if let Some(path) = args.export {
        return export_to_file(&rt, &gateway, settings.window_hours, &path);
    }

    let cadences = settings.cadences()?;
    let retry = settings.stream_retry()?;
    let (tx, rx) = mpsc::unbounded_channel();
    let source: Arc<dyn TelemetrySource> = Arc::new(gateway.clone());

    let _guard = rt.enter();
    let mut dashboard = Dashboard::new(source, tracker, tx.clone(), settings.dashboard_options());
    let stream = PushStream::connect(&gateway, retry);
    let _scheduler = Scheduler::start(&cadences, Some(stream), tx);
    dashboard.refresh_all();

    if args.headless {
        return rt.block_on(run_headless(dashboard, rx));
    }

    let export_dir = std::env::current_dir().context("Failed to resolve export directory")?;
    let app = App::new(dashboard, rx, export_dir, Theme::auto_detect());
    run_tui(app)
}

/// Send logs to stderr in headless mode and to a file otherwise, so they
/// never scribble over the TUI.
fn init_logging(args: &Args) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if args.headless || args.export.is_some() {
        builder.with_writer(io::stderr).init();
    } else {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&args.log_file)
            .with_context(|| format!("Failed to open log file {}", args.log_file.display()))?;
        builder.with_ansi(false).with_writer(Mutex::new(file)).init();
    }
    Ok(())
}

/// Fetch the CSV for the last `hours` and write it to `path`.
fn export_to_file(rt: &Runtime, gateway: &ApiGateway, hours: u32, path: &Path) -> Result<()> {
    let range = ExportRange::build(&WindowSelection::preset(hours), Utc::now())?;
    let export = rt
        .block_on(gateway.export_csv(Some(&range)))
        .context("Export request failed")?;
    export
        .save_as(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Exported {} bytes to: {}", export.bytes.len(), path.display());
    Ok(())
}

/// Apply events as they arrive and log a line per change until Ctrl-C.
async fn run_headless(
    mut dashboard: Dashboard,
    mut rx: mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    info!("Running headless; press Ctrl-C to stop");
    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else { break };
                let label = describe(&event);
                if dashboard.handle(event) {
                    info!(
                        connection = dashboard.connection().label(),
                        feed = dashboard.feed.len(),
                        nodes = dashboard.nodes.len(),
                        decisions = dashboard.decisions.len(),
                        datasets = dashboard.chart.datasets.len(),
                        "Updated {}",
                        label
                    );
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }
    Ok(())
}

fn describe(event: &Event) -> String {
    match event {
        Event::Tick(resource) => format!("{} tick", resource.label()),
        Event::Stream(_) => "stream".to_string(),
        Event::Loaded(loaded) => loaded.resource().label().to_string(),
        Event::Exported(_) => "export".to_string(),
    }
}

/// Run the TUI until the user quits.
fn run_tui(mut app: App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic);
    }));

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 70;
    const MIN_HEIGHT: u16 = 14;

    while app.running {
        terminal.draw(|frame| {
            let area = frame.area();

            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                let top = (area.height / 2).saturating_sub(2);
                let centered = ratatui::layout::Rect::new(0, top, area.width, 5.min(area.height));
                frame.render_widget(paragraph, centered);
                return;
            }

            ui::draw(frame, app);
        })?;

        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                TermEvent::Key(key) => events::handle_key_event(app, key),
                TermEvent::Mouse(mouse) => events::handle_mouse_event(app, mouse),
                _ => {}
            }
        }

        app.drain_events();
    }

    Ok(())
}
