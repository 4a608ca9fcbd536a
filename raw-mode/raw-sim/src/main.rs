use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use raw_rs::{
    serdes::{serialize_frame_cobs, FRAME_BUFFER_SIZE},
    RawFrame, RawMessage, RawMode, RawPayload,
};

mod config;
mod script;

use script::ScriptDriver;

/// Replays a raw sensor script through the raw mode pipeline
#[derive(Parser, Debug)]
#[command(name = "raw-sim")]
#[command(about = "Replay raw sensor samples and print the emitted frames", long_about = None)]
#[command(version)]
pub struct Args {
    /// JSON file holding a full raw mode configuration
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// JSON-lines sample script, one sample per line
    #[arg(short, long, value_name = "FILE")]
    pub script: PathBuf,

    /// Reports allowed per tick (required without --config)
    #[arg(long)]
    pub budget: Option<u8>,

    /// Button debounce window (required without --config)
    #[arg(long)]
    pub debounce_ms: Option<u32>,

    /// Button long press threshold (required without --config)
    #[arg(long)]
    pub long_press_ms: Option<u32>,

    /// Do not attach the activity mask to frames
    #[arg(long)]
    pub no_mask: bool,

    /// Amplitude of uniform noise added to continuous raw readings
    #[arg(long, default_value_t = 0.0)]
    pub noise: f32,

    /// Seed for the noise generator
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let raw_config = config::load_config(&args)?;

    let mut driver = ScriptDriver::load(&args.script)?;
    if args.noise != 0.0 {
        driver.set_noise(args.noise, args.seed)?;
    }
    if driver.is_empty() {
        warn!("Script {} holds no samples", args.script.display());
    }
    info!("Loaded {} samples from {}", driver.len(), args.script.display());

    let mut raw_mode = RawMode::new(raw_config)
        .map_err(|err| anyhow::anyhow!("{}", err))
        .context("Invalid raw mode configuration")?;

    let mut buffer = [0_u8; FRAME_BUFFER_SIZE];
    while driver.has_next() {
        let frame = raw_mode.update_from_driver(&mut driver);
        if frame.is_empty() {
            continue;
        }

        match serialize_frame_cobs(&frame, &mut buffer) {
            Ok(size) => {
                let timestamp_ms = driver.last_timestamp_ms();
                println!("{}", format_frame(timestamp_ms, &frame, &buffer[..size]));
            }
            Err(err) => warn!("Failed to serialize frame: {}", err),
        }
    }

    let stats = raw_mode.stats();
    info!(
        "{} ticks, {} reports in {} frames, {} deferrals",
        stats.ticks, stats.reports, stats.frames_with_reports, stats.deferred
    );
    println!("{}", serde_json::to_string(stats)?);

    Ok(())
}

fn format_frame(timestamp_ms: u64, frame: &RawFrame, encoded: &[u8]) -> String {
    let mask = frame
        .mask
        .map_or_else(|| String::from("-"), |mask| format!("{:#010x}", mask.bits()));

    let messages = match frame.messages() {
        Ok(messages) => messages
            .iter()
            .map(format_message)
            .collect::<Vec<_>>()
            .join(" "),
        Err(err) => format!("<{}>", err),
    };

    let hex = encoded
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect::<String>();

    format!("{:>8} ms mask={} {} cobs={}", timestamp_ms, mask, messages, hex)
}

fn format_message(message: &RawMessage) -> String {
    match message.payload {
        RawPayload::Value(value) => format!("{}={}", message.source, value),
        RawPayload::Button(status) => {
            let mut flags = String::new();
            for (set, flag) in [
                (status.pressed, 'P'),
                (status.toggle_on, '+'),
                (status.toggle_off, '-'),
                (status.long_press, 'L'),
            ] {
                if set {
                    flags.push(flag);
                }
            }
            format!("{}=[{}]", message.source, flags)
        }
    }
}
