fn main() {
    match print_devices() {
        Ok(_) => {}
        Err(err) => eprintln!("Error: {err}"),
    }
}

/// Selects the default backend and prints every playback and capture
/// device it can see.
fn print_devices() -> Result<(), audiocore::Error> {
    let context = audiocore::Context::init_default(audiocore::ContextConfig::default())?;

    println!("Backend: {:?}", context.backend_id());

    println!("Playback devices:");
    for info in context.enumerate_devices(audiocore::DeviceKind::Playback)? {
        println!(" - {} ({})", info.name, info.id);
    }

    println!("Capture devices:");
    for info in context.enumerate_devices(audiocore::DeviceKind::Capture)? {
        println!(" - {} ({})", info.name, info.id);
    }

    Ok(())
}
