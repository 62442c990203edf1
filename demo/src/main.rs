mod config;

use crate::config::{Backend, Config, Settings};
use charlcd_gpio::gpiod::GpiodDriver;
use charlcd_gpio::lcd::hd44780::sim::TraceInterface;
use charlcd_gpio::lcd::hd44780::{Hd44780Lcd, LcdInterface, PinInterface};
use charlcd_gpio::{GpioActiveLevel, GpioDriver};
use dotenv::dotenv;
use log::{debug, info};
use std::thread::sleep;
use std::time::Duration;
use sysinfo::System;
use time::OffsetDateTime;
use time::macros::format_description;

const UNKNOWN_STR: &str = "???";

fn main() -> eyre::Result<()> {
    // Initialize environment and logger
    dotenv().ok();
    pretty_env_logger::init();

    info!(
        "Hello, {}!",
        System::name().as_deref().unwrap_or(UNKNOWN_STR)
    );
    info!(
        "System ver {} kernel ver {}",
        System::long_os_version().as_deref().unwrap_or(UNKNOWN_STR),
        System::kernel_version().as_deref().unwrap_or(UNKNOWN_STR),
    );

    let settings = Settings::from_env()?;
    let config = Config::try_load().unwrap_or_default();
    info!(
        "LCD {}x{} ({:?} addressing) via {:?}",
        settings.columns, settings.lines, settings.addressing, settings.backend
    );

    match settings.backend {
        Backend::Trace => run(TraceInterface::new(), &settings, &config),
        Backend::Gpiod => {
            let [d4, d5, d6, d7, e, rs] = settings
                .pins
                .ok_or_else(|| eyre::eyre!("No LCD pins configured"))?;
            info!("LCD @ E: {}, RS: {}, Data: {:?}", e, rs, [d4, d5, d6, d7]);

            debug!("Initializing GPIO driver...");
            let gpio = GpiodDriver::open(&settings.chip)?;
            debug!("{:?} initialized.", gpio);

            let out = |index| gpio.get_output(index, GpioActiveLevel::High);
            let (e, rs) = (out(e)?, out(rs)?);
            let (d4, d5, d6, d7) = (out(d4)?, out(d5)?, out(d6)?, out(d7)?);

            let interface = PinInterface::new(&*e, &*rs, [&*d4, &*d5, &*d6, &*d7]);
            run(interface, &settings, &config)
        }
    }
}

fn run(interface: impl LcdInterface, settings: &Settings, config: &Config) -> eyre::Result<()> {
    let mut lcd =
        Hd44780Lcd::init_with(interface, settings.lines, settings.columns, settings.addressing)?;

    let banner = config
        .banner
        .clone()
        .or_else(System::host_name)
        .unwrap_or_else(|| UNKNOWN_STR.to_string());
    let banner: String = banner.chars().take(settings.columns as usize).collect();
    info!("Showing banner {:?}", banner);

    lcd.set_cursor(0, 0)?;
    lcd.print(&banner)?;

    let clock_line = if settings.lines > 1 { 1 } else { 0 };
    let format = format_description!("[hour]:[minute]:[second]");
    let mut shown = 0u64;

    loop {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        lcd.set_cursor(clock_line, 0)?;
        lcd.print_fmt(format_args!("{}", now.format(&format)?))?;

        shown += 1;
        if settings.seconds != 0 && shown >= settings.seconds {
            break;
        }
        sleep(Duration::from_secs(1));
    }

    info!("Done after {} s", shown);
    Ok(())
}
