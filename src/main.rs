//! # Dashboard Application Entry Point
//!
//! One invocation is one refresh pass: load the configuration, fetch every
//! provider, reconcile against the cache snapshot, render the layout and
//! push the frame to the panel (or to stdout in development mode), then
//! exit. Scheduling between passes belongs to cron or a systemd timer.


#[cfg(feature = "hardware")]
mod gpio;
#[cfg(feature = "hardware")]
mod spi;

use anyhow::Context;
use chrono::Local;
use env_logger::Env;
use epd_dashboard::{
    cache,
    config::{Config, DEFAULT_CONFIG_FILE},
    display::{self, AsciiEpd, Epd},
    frame::Frame,
    freshness, layout, providers,
};
use std::env;

struct Args {
    config_path: String,
    stdout_mode: bool,
}

fn parse_args() -> Args {
    let mut args = Args {
        config_path: DEFAULT_CONFIG_FILE.to_string(),
        stdout_mode: false,
    };
    let mut iter = env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                if let Some(path) = iter.next() {
                    args.config_path = path;
                }
            }
            // Development mode: render to stdout instead of the panel
            "--stdout" => args.stdout_mode = true,
            other => log::warn!("ignoring unknown argument: {}", other),
        }
    }
    args
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = parse_args();

    // A broken configuration is fatal; there is nothing sensible to draw.
    let config = Config::load_from_path(&args.config_path)
        .with_context(|| format!("failed to load {}", args.config_path))?;

    let rt = tokio::runtime::Runtime::new()?;
    let fetched = rt.block_on(async {
        tokio::select! {
            fetched = providers::fetch_all(&config) => Some(fetched),
            _ = tokio::signal::ctrl_c() => None,
        }
    });
    let Some(fetched) = fetched else {
        log::info!("interrupted, skipping display update");
        return Ok(());
    };

    let mut snapshot = cache::load(&config.cache_file);
    let data = freshness::assemble(&fetched, &snapshot);
    freshness::refresh_snapshot(&mut snapshot, &data);
    if let Err(e) = cache::save(&config.cache_file, &snapshot) {
        // A read-only filesystem costs cache continuity, not the render.
        log::warn!("failed to persist {}: {}", config.cache_file, e);
    }

    let renderer = layout::Renderer::new(&config)?;
    let frame = renderer.render(&data, Local::now());

    let (width, height) = display::native_size(&config.display.epd_display_type)
        .context("unknown display type")?;

    if args.stdout_mode {
        return update_display(&mut AsciiEpd::new(width, height), &frame);
    }

    #[cfg(feature = "hardware")]
    {
        let mut epd = hardware_display()?;
        update_display(&mut epd, &frame)
    }

    #[cfg(not(feature = "hardware"))]
    {
        log::warn!("built without the hardware feature, showing ASCII preview");
        update_display(&mut AsciiEpd::new(width, height), &frame)
    }
}

/// Full panel lifecycle for one frame. The sleep command runs even when
/// the refresh fails: e-paper left powered after an update degrades.
fn update_display(epd: &mut dyn Epd, frame: &Frame) -> anyhow::Result<()> {
    epd.init()?;
    let shown = epd.clear().and_then(|_| epd.show(frame));
    let slept = epd.sleep();
    shown.context("display refresh failed")?;
    slept.context("display sleep failed")?;
    log::info!("display updated");
    Ok(())
}

#[cfg(feature = "hardware")]
fn hardware_display() -> anyhow::Result<impl Epd> {
    use epd_dashboard::epd2in15g::Epd2in15g;

    // Waveshare e-paper HAT wiring (BCM numbering).
    const CS: u32 = 8;
    const DC: u32 = 25;
    const RST: u32 = 17;
    const BUSY: u32 = 24;

    let mut chip = gpio_cdev::Chip::new("/dev/gpiochip0").context("open gpiochip0")?;
    let cs = gpio::CdevOutputPin::new(&mut chip, CS)?;
    let dc = gpio::CdevOutputPin::new(&mut chip, DC)?;
    let rst = gpio::CdevOutputPin::new(&mut chip, RST)?;
    let busy = gpio::CdevInputPin::new(&mut chip, BUSY)?;
    let spi = spi::SpidevBus::new()?;

    Ok(Epd2in15g::new(spi, cs, dc, rst, busy))
}
