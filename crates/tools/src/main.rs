use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use foundation::time::TimeMs;
use serde_json::json;
use tour::labels::labels_for;
use tour::sink::SinkLog;
use tour::{
    FixedViewport, HostEvent, InteractionKind, JsonFileProvider, LabelCollisionResolver,
    RecordingSinkFactory, TourConfig, TourDataProvider, TourEngine, Viewport,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Offline driver for the location tour engine")]
struct Args {
    /// Engine config (flat JSON object); defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Viewport width in pixels, used to pick the breakpoint
    #[arg(long, global = true, default_value_t = 1280.0)]
    width: f64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the tour on a virtual clock and print every renderer call as JSON lines
    Simulate {
        /// Tour data: { "locations": [...], "ports": [...] }
        #[arg(long)]
        data: PathBuf,

        /// Stop the clock at this time (ms)
        #[arg(long, default_value_t = 30_000.0)]
        until_ms: f64,

        /// Inject a pointer interaction at these times (ms), comma separated
        #[arg(long, value_delimiter = ',')]
        interact_at: Vec<f64>,
    },

    /// Print the decluttered labels for one location
    Labels {
        #[arg(long)]
        data: PathBuf,

        /// Location name or id
        #[arg(long)]
        location: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => TourConfig::load(path)?,
        None => TourConfig::default(),
    };
    let viewport = FixedViewport::new(args.width, config.camera.breakpoint_px);

    match args.command {
        Command::Simulate {
            data,
            until_ms,
            interact_at,
        } => simulate(config, &viewport, &data, until_ms, interact_at)?,
        Command::Labels { data, location } => print_labels(&config, &viewport, &data, &location)?,
    }

    Ok(())
}

fn simulate(
    config: TourConfig,
    viewport: &FixedViewport,
    data: &Path,
    until_ms: f64,
    mut interact_at: Vec<f64>,
) -> Result<(), Box<dyn std::error::Error>> {
    if !until_ms.is_finite() {
        return Err("--until-ms must be a finite number".into());
    }
    interact_at.retain(|t| t.is_finite());
    interact_at.sort_by(f64::total_cmp);
    let mut pending = interact_at.into_iter().peekable();

    let factory = RecordingSinkFactory::new();
    let log = factory.log();
    let mut engine = TourEngine::new(config, factory, viewport)?;
    engine.load(&JsonFileProvider::new(data));
    engine.handle(HostEvent::RendererReady);
    flush(&mut engine, &log)?;

    // Jump from one timer or interaction to the next; nothing changes in between.
    while engine.now().0 < until_ms {
        let timer = engine.next_deadline().map_or(until_ms, |d| d.0);
        let interaction = pending.peek().copied().unwrap_or(until_ms);
        let t = timer.min(interaction).min(until_ms);
        engine.advance_to(TimeMs(t));
        while pending.next_if(|at| *at <= t).is_some() {
            engine.handle(HostEvent::Interaction(InteractionKind::Pointer));
        }
        flush(&mut engine, &log)?;
    }

    let snapshot = engine.metrics().snapshot();
    println!(
        "{}",
        json!({ "metrics": { "counters": snapshot.counters, "gauges": snapshot.gauges } })
    );
    info!(until_ms, "simulation finished\n{snapshot}");
    Ok(())
}

fn flush(
    engine: &mut TourEngine<RecordingSinkFactory>,
    log: &SinkLog,
) -> Result<(), serde_json::Error> {
    let t = engine.now().0;
    for event in engine.drain_events() {
        println!("{}", json!({ "t": event.at.0, "event": serde_json::to_value(&event.event)? }));
    }
    for call in log.borrow_mut().drain(..) {
        println!("{}", json!({ "t": t, "sink": serde_json::to_value(&call)? }));
    }
    Ok(())
}

fn print_labels(
    config: &TourConfig,
    viewport: &dyn Viewport,
    data: &Path,
    location: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = JsonFileProvider::new(data).fetch()?;
    let Some(found) = data
        .locations
        .iter()
        .find(|l| l.name == location || l.id == location)
    else {
        return Err(format!("unknown location: {location}").into());
    };

    let style = config.labels.style(viewport.breakpoint());
    let resolver =
        LabelCollisionResolver::new(config.labels.cell_size_deg, config.labels.max_nudges);
    let labels = resolver.resolve(&labels_for(found, &data.ports, style));
    println!("{}", serde_json::to_string_pretty(&labels)?);
    Ok(())
}
