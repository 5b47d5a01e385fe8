use fpm_rs::{CharBuffer, Presence, SearchResult, SensorError};
use std::{
    io::{stdin, Read},
    thread,
    time::Duration,
};

fn main() -> Result<(), SensorError> {
    env_logger::init();
    let mut sensor = fpm_rs::open(
        None,
        fpm_rs::DEFAULT_BAUD,
        Duration::from_secs(1),
        fpm_rs::DEFAULT_ADDRESS,
        fpm_rs::DEFAULT_PASSWORD,
    )?;
    println!(
        "Opened module with {} stored templates.",
        sensor.template_count()?
    );

    loop {
        println!("Scan your finger now.");
        while sensor.get_image()? == Presence::NoFinger {
            thread::sleep(Duration::from_millis(50));
        }

        match sensor.image_to_template(CharBuffer::One) {
            Ok(()) => match sensor.fast_search()? {
                SearchResult::Found(found) => {
                    println!("MATCH! slot {} (confidence {})", found.id, found.confidence)
                }
                SearchResult::NotFound => println!("NO MATCH!"),
            },
            Err(e) => println!("Scan didn't quite work ({}). Please try again.", e),
        }

        println!("Press Enter to identify again or Ctrl+C to cancel.");
        let _ = stdin().read(&mut [0u8]);
    }
}
