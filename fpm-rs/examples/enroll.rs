use fpm_rs::{CharBuffer, Presence, Sensor, SensorError, Transport};
use std::{thread, time::Duration};

fn get_slot() -> u16 {
    std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .expect("Slot number not found (must be first argument)")
}

fn wait_for(sensor: &mut Sensor<impl Transport>, wanted: Presence) -> Result<(), SensorError> {
    while sensor.get_image()? != wanted {
        thread::sleep(Duration::from_millis(50));
    }

    Ok(())
}

fn main() -> Result<(), SensorError> {
    env_logger::init();
    let slot = get_slot();
    let mut sensor = fpm_rs::open(
        None,
        fpm_rs::DEFAULT_BAUD,
        Duration::from_secs(1),
        fpm_rs::DEFAULT_ADDRESS,
        fpm_rs::DEFAULT_PASSWORD,
    )?;

    println!(
        "This program will enroll a finger into slot {}, \
         unconditionally overwriting any template stored there.",
        slot
    );

    for (time, buffer) in [CharBuffer::One, CharBuffer::Two].iter().enumerate() {
        println!("Scan your finger now (time: {}).", time + 1);
        wait_for(&mut sensor, Presence::Finger)?;
        sensor.image_to_template(*buffer)?;
        println!("Image converted into buffer {}. Remove your finger.", buffer);
        wait_for(&mut sensor, Presence::NoFinger)?;
    }

    sensor.create_model()?;
    sensor.store_model(slot)?;
    println!("Enrollment completed!");

    Ok(())
}
