use clap::Parser;
use failure::{format_err, Error};
use fpm_rs::{LedColor, Sensor, SerialPort, Uart};
use spacs::{
    config::Config,
    console::Console,
    link,
    notify::HttpNotifier,
    outputs::{Blink, Outputs},
    terminal::Terminal,
};
use std::{io, path::PathBuf, thread, time::Duration};

#[derive(Debug, Parser)]
#[command(version, about = "Fingerprint door terminal")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, default_value = "spacs.toml")]
    config: PathBuf,
    /// Serial device of the fingerprint module (overrides the config file)
    #[arg(short, long)]
    port: Option<PathBuf>,
    /// Report server as HOST or HOST:PORT (overrides the config file)
    #[arg(short, long)]
    server: Option<String>,
}

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = Config::load(&args.config)?;
    apply_overrides(&mut config, &args)?;

    let mut outputs = Outputs::from_config(&config.outputs)?;

    let uplink = link::from_config(&config.link);
    let link_up = link::wait_for_link(
        uplink.as_ref(),
        config.link.connect_attempts,
        Duration::from_millis(config.link.connect_interval_ms),
    );
    if !link_up {
        log::error!("Failed to bring up the network link. Events will be dropped until it is up.");
        outputs.status_led.blink(Blink::LINK_DOWN);
    }

    log::info!("Initializing fingerprint sensor...");
    let sensor = match open_sensor(&config) {
        Ok(sensor) => sensor,
        Err(e) => {
            log::error!("Fingerprint sensor not found. Please check wiring. ({})", e);
            outputs.status_led.blink(Blink::SENSOR_MISSING);
            return Err(e);
        }
    };

    let notifier = HttpNotifier::new(config.server.clone(), uplink);
    let mut terminal = Terminal::new(sensor, notifier, outputs, config.timing.clone());

    let stdin = io::stdin();
    let mut console = Console::new(stdin.lock(), io::stdout());
    console.run(&mut terminal)?;

    Ok(())
}

fn apply_overrides(config: &mut Config, args: &Args) -> Result<(), Error> {
    if let Some(port) = &args.port {
        config.sensor.port = Some(port.clone());
    }

    if let Some(server) = &args.server {
        let mut parts = server.splitn(2, ':');
        config.server.host = parts.next().unwrap_or_default().to_string();
        if let Some(port) = parts.next() {
            config.server.port = port
                .parse()
                .map_err(|_| format_err!("Invalid server port `{}`", port))?;
        }
    }

    config.validate()?;
    Ok(())
}

fn open_sensor(config: &Config) -> Result<Sensor<Uart<SerialPort>>, Error> {
    let sensor_config = &config.sensor;
    let timeout = Duration::from_millis(sensor_config.reply_timeout_ms);

    let mut sensor = match &sensor_config.port {
        Some(port) => fpm_rs::handshake(
            fpm_rs::open(
                Some(port.as_path()),
                sensor_config.baud,
                timeout,
                sensor_config.address,
                sensor_config.password,
            )?,
            sensor_config.address,
            sensor_config.password,
        )?,
        None => fpm_rs::open(
            None,
            sensor_config.baud,
            timeout,
            sensor_config.address,
            sensor_config.password,
        )?,
    }
    .with_capacity(sensor_config.capacity);

    match sensor.template_count() {
        Ok(count) => log::info!(
            "Fingerprint sensor detected! {} of {} slots used.",
            count,
            sensor_config.capacity
        ),
        Err(e) => log::warn!("Fingerprint sensor detected, but template count failed: {}", e),
    }

    if let Err(e) = sensor.led_on(LedColor::Blue) {
        log::debug!("ring LED: {}", e);
    }
    thread::sleep(Duration::from_millis(500));
    if let Err(e) = sensor.led_off() {
        log::debug!("ring LED: {}", e);
    }

    Ok(sensor)
}
