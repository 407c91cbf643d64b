use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn, LevelFilter};
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use dmx_widget::config::Config;
use dmx_widget::{ports, Controller, Mk2Controller, Port};

#[derive(Parser)]
#[command(name = "dmx_widget")]
#[command(about = "DMX USB Pro widget tool\n\nLists serial devices and drives a widget from a JSON scene file.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug output (frames sent)
    #[arg(long, global = true)]
    debug: bool,

    /// Enable detailed debug (hex dumps every frame)
    #[arg(long, global = true)]
    ddebug: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Print every serial port and its USB details
    List,
    /// Open the widget, apply the configured scene and hold it until Ctrl-C
    Run {
        /// Path to configuration file (JSON)
        config: String,
    },
}

enum Widget {
    Pro(Controller),
    Mk2(Mk2Controller, Port),
}

impl Widget {
    fn open(config: &Config, path: &str) -> Result<Self> {
        let widget = match config.mk2_port {
            Some(port) => Widget::Mk2(
                Mk2Controller::open(path, &config.serial, config.controller.clone())
                    .with_context(|| format!("Failed to open Mk2 widget on {}", path))?,
                port,
            ),
            None => Widget::Pro(
                Controller::open(path, &config.serial, config.controller.clone())
                    .with_context(|| format!("Failed to open widget on {}", path))?,
            ),
        };
        Ok(widget)
    }

    fn apply(&mut self, config: &Config) -> Result<()> {
        if let Some(params) = &config.parameters {
            match self {
                Widget::Pro(dmx) => dmx.set_dmx_parameters(params),
                Widget::Mk2(dmx, port) => dmx.set_port_widget_parameters(*port, params),
            }
            .context("Failed to send widget parameters")?;
        }

        for scene in &config.channels {
            match self {
                Widget::Pro(dmx) => dmx.set_channel(scene.channel, scene.value, Some(false)),
                Widget::Mk2(dmx, port) => dmx.set_channel(*port, scene.channel, scene.value, Some(false)),
            }
            .with_context(|| format!("Invalid scene entry for channel {}", scene.channel))?;
        }

        self.submit().context("Failed to submit scene")
    }

    fn submit(&mut self) -> dmx_widget::Result<()> {
        match self {
            Widget::Pro(dmx) => dmx.submit(),
            Widget::Mk2(dmx, port) => dmx.submit(*port),
        }
    }

    /// Black out and release the widget
    fn shutdown(mut self) -> Result<()> {
        let cleared = match &mut self {
            Widget::Pro(dmx) => dmx.clear_channels(Some(true)),
            Widget::Mk2(dmx, port) => dmx.clear_channels(*port, Some(true)),
        };
        if let Err(e) = cleared {
            warn!("Failed to black out: {}", e);
        }

        match &mut self {
            Widget::Pro(dmx) => dmx.close(),
            Widget::Mk2(dmx, _) => dmx.close(),
        }
        .context("Failed to close widget")
    }
}

fn init_logger(debug: bool, ddebug: bool) {
    let mut builder = pretty_env_logger::formatted_builder();
    if ddebug {
        builder.filter_level(LevelFilter::Trace);
    } else if debug {
        builder.filter_level(LevelFilter::Debug);
    } else if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    } else {
        builder.filter_level(LevelFilter::Info);
    }
    builder.init();
}

fn list() -> Result<()> {
    let ports = ports::list_ports().context("Failed to enumerate serial ports")?;
    if ports.is_empty() {
        println!("No serial ports found");
    }
    for port in ports {
        println!("{}\n", port);
    }
    Ok(())
}

fn run(config_path: &str) -> Result<()> {
    let config_data = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read {}", config_path))?;
    let config = Config::from_json(&config_data)
        .with_context(|| format!("Failed to parse {}", config_path))?;

    let path = config.device.resolve().context("Failed to locate widget")?;
    let mut widget = Widget::open(&config, &path)?;

    if let Err(e) = widget.apply(&config) {
        widget.shutdown()?;
        return Err(e);
    }

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = Arc::clone(&running);
    if let Err(e) = ctrlc::set_handler(move || {
        handler_flag.store(false, Ordering::Relaxed);
    }) {
        warn!("Could not set Ctrl-C handler: {}", e);
    }

    info!("Holding scene on {} (press Ctrl-C to stop)", path);
    while running.load(Ordering::Relaxed) {
        thread::sleep(Duration::from_millis(100));
    }

    info!("Shutting down...");
    widget.shutdown()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ddebug implies debug
    init_logger(cli.debug || cli.ddebug, cli.ddebug);

    match cli.command {
        Command::List => list(),
        Command::Run { config } => run(&config),
    }
}
