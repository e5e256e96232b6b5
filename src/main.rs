// rsdb: machine-level debugger shell over the expression/watchpoint core

use std::fs;
use std::io;
use std::path::Path;

use rsdb::machine::flat::FlatMachine;
use rsdb::shell::Session;

/// RAM window given to the demo machine.
const RAM_BYTES: usize = 128 * 1024;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 2 {
        let program_name = args.first().map(|s| s.as_str()).unwrap_or("rsdb");
        eprintln!("Usage: {} [image.bin]", program_name);
        eprintln!();
        eprintln!("Starts the monitor on a flat demo machine; an optional");
        eprintln!("raw image is loaded at the RAM window base.");
        std::process::exit(1);
    }

    let mut machine = FlatMachine::new(RAM_BYTES);

    if let Some(image_path) = args.get(1) {
        if !Path::new(image_path).exists() {
            eprintln!("Error: File '{}' not found", image_path);
            std::process::exit(1);
        }
        let image = fs::read(image_path)?;
        machine.load_image(&image);
        eprintln!(
            "Loaded {} bytes at {:#010x}",
            image.len().min(machine.ram_len()),
            machine.ram_base()
        );
    }

    let stdin = io::stdin();
    Session::new(machine).run(stdin.lock())?;

    Ok(())
}
