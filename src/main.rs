//! Command-line front end for the plate controller.

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;

use photostim::device::{control, info::read_device_info};
use photostim::protocol::registers::Stage;
use photostim::transport::CommandPort;
use photostim::units::inference::analyze_all_stages;
use photostim::{Settings, StageReadingCollector};

#[derive(Parser)]
#[command(name = "photostim", version, about = "Photostimulation plate controller")]
struct Cli {
    /// Serial port device, overriding the configured one.
    #[arg(long, global = true)]
    port: Option<String>,

    /// Emit machine-readable JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Poll every stage and run unit inference over the readings.
    Status,
    /// Read the device identity block.
    Info,
    /// Apply an ARM current and enter armed mode.
    Arm {
        /// ARM current in mA.
        current_ma: u16,
    },
    /// Fire one stage at its configured current, or at an explicit current.
    Fire {
        /// Stage number (1-5).
        stage: u8,
        /// Drive current in mA; defaults to the stage's own setting.
        #[arg(long)]
        current_ma: Option<u16>,
    },
    /// Switch the output off (standby).
    Off,
    /// Standby, then return control to the front panel.
    Shutdown,
}

#[cfg(feature = "instrument_serial")]
fn open_port(
    settings: &Settings,
) -> anyhow::Result<CommandPort<photostim::transport::SerialTransport>> {
    let transport = photostim::transport::SerialTransport::open(
        &settings.serial.port,
        settings.serial.baud_rate,
        settings.serial.read_timeout,
    )
    .with_context(|| format!("opening serial port '{}'", settings.serial.port))?;
    Ok(CommandPort::new(transport, settings.decode_mode))
}

#[cfg(not(feature = "instrument_serial"))]
fn open_port(
    _settings: &Settings,
) -> anyhow::Result<CommandPort<photostim::transport::mock::MockDevice>> {
    Err(photostim::PhotostimError::SerialFeatureDisabled.into())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut settings = Settings::new().context("loading configuration")?;
    if let Some(port) = &cli.port {
        settings.serial.port = port.clone();
    }
    settings.validate()?;

    let mut port = open_port(&settings)?;

    match cli.command {
        Command::Status => {
            let mut collector = StageReadingCollector::new(port)
                .with_read_pacing(settings.serial.read_pacing);
            let readings = collector.collect_all();
            let analysis = analyze_all_stages(&readings, &settings.geometry.geometry());

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            } else {
                println!(
                    "LED classification: {:?} ({} sample(s), confidence {})",
                    analysis.classification.led_type,
                    analysis.classification.sample_count,
                    analysis.classification.confidence
                );
                for (reading, stage) in readings.iter().zip(&analysis.stages) {
                    println!("{}:", reading.stage);
                    for (kind, entry) in stage.matrix.iter() {
                        // iter() only yields filled slots
                        let value = entry.value.unwrap_or_default();
                        println!(
                            "  {:?}: {:.3} {} [{} / {}]",
                            kind,
                            value,
                            kind.unit_symbol(),
                            entry.source,
                            entry.confidence
                        );
                    }
                }
            }
        }
        Command::Info => {
            let device_info = read_device_info(&mut port)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&device_info)?);
            } else {
                println!("firmware: {}", device_info.firmware_version);
                println!("model:    {}", device_info.model_number);
                println!("serial:   {}", device_info.serial_number);
                println!("wavelength: {}", device_info.wavelength);
            }
        }
        Command::Arm { current_ma } => {
            control::arm(&mut port, current_ma)?;
            info!("armed at {} mA", current_ma);
        }
        Command::Fire { stage, current_ma } => {
            let stage = Stage::new(stage)?;
            match current_ma {
                Some(ma) => control::fire_with_current(&mut port, ma)?,
                None => control::fire_stage(&mut port, stage)?,
            }
        }
        Command::Off => {
            control::turn_off(&mut port)?;
            info!("output off");
        }
        Command::Shutdown => {
            control::shutdown(&mut port)?;
            info!("device returned to local control");
        }
    }

    Ok(())
}
