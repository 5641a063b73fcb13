use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use trackstat_rs::{Config, Renderer, open_file_pipeline, server};

/// Region counting and speed overlay for tracked video frames
#[derive(Parser, Debug)]
#[command(name = "trackstat", author, version, about, long_about = None)]
struct Cli {
    /// YAML configuration file; defaults apply when it does not exist
    #[arg(short, long, global = true, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the annotated stream over HTTP
    Serve {
        #[command(flatten)]
        input: InputArgs,

        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Process the sequence once without serving it
    Run {
        #[command(flatten)]
        input: InputArgs,

        /// Save annotated frames as JPEG files here
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },
}

#[derive(ClapArgs, Debug)]
struct InputArgs {
    /// Directory of frame images
    #[arg(short, long, value_name = "DIR")]
    frames: Option<PathBuf>,

    /// Tracker output in MOT format
    #[arg(short, long, value_name = "FILE")]
    tracks: Option<PathBuf>,

    /// Nominal frame rate of the sequence
    #[arg(long)]
    fps: Option<f64>,

    /// Stats log destination
    #[arg(long, value_name = "FILE")]
    log: Option<PathBuf>,
}

impl InputArgs {
    fn apply(self, config: &mut Config) {
        if let Some(frames) = self.frames {
            config.input.frames_dir = frames;
        }
        if let Some(tracks) = self.tracks {
            config.input.tracks_file = tracks;
        }
        if let Some(fps) = self.fps {
            config.input.frame_rate = fps;
        }
        if let Some(log) = self.log {
            config.output.log_path = log;
        }
    }
}

fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        Config::load(path).with_context(|| format!("Failed to load {}", path.display()))
    } else {
        Ok(Config::default())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(&cli.config)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "trackstat={level},trackstat_rs={level},actix_web=info",
            level = config.logging.level
        ))
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if !cli.config.exists() {
        warn!("{} not found, using defaults", cli.config.display());
    }

    let renderer =
        Arc::new(Renderer::from_config(&config.render).context("Failed to load renderer")?);

    match cli.command {
        Command::Serve { input, host, port } => {
            input.apply(&mut config);
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            actix_web::rt::System::new()
                .block_on(server::serve(config, renderer))
                .context("HTTP server error")?;
        }
        Command::Run { input, output_dir } => {
            input.apply(&mut config);
            run_headless(&config, renderer, output_dir.as_deref())?;
        }
    }
    Ok(())
}

fn run_headless(config: &Config, renderer: Arc<Renderer>, output_dir: Option<&Path>) -> Result<()> {
    if let Some(dir) = output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let mut pipeline = open_file_pipeline(config, renderer).context("Failed to open run")?;
    let mut write_error = None;
    let summary = pipeline.run(|frame| {
        let Some(dir) = output_dir else {
            return ControlFlow::Continue(());
        };
        let path = dir.join(format!("{:06}.jpg", frame.index));
        match std::fs::write(&path, &frame.jpeg) {
            Ok(()) => ControlFlow::Continue(()),
            Err(err) => {
                write_error = Some(
                    anyhow::Error::new(err).context(format!("Failed to write {}", path.display())),
                );
                ControlFlow::Break(())
            }
        }
    })?;

    info!("✓ Run complete");
    info!("  Frames processed: {}", summary.frames);
    info!("  Records logged: {}", summary.records);
    info!("  Unique objects: {}", summary.unique_objects);
    for (region, count) in &summary.region_counts {
        info!("  Region {region}: {count}");
    }
    info!("  Stats log: {}", config.output.log_path.display());

    match write_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
