use fpm_rs::SensorError;
use std::time::Duration;

fn main() -> Result<(), SensorError> {
    env_logger::init();
    let path = std::env::args().nth(1).map(std::path::PathBuf::from);
    let mut sensor = fpm_rs::open(
        path.as_deref(),
        fpm_rs::DEFAULT_BAUD,
        Duration::from_secs(1),
        fpm_rs::DEFAULT_ADDRESS,
        fpm_rs::DEFAULT_PASSWORD,
    )?;
    sensor.verify_password()?;

    let params = sensor.read_params()?;
    println!("{:#?}", params);
    println!("{} of {} slots used", sensor.template_count()?, params.capacity);

    Ok(())
}
