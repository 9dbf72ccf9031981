use clap::Parser;

use pet_ranch::app::{self, Args};

fn main() {
    env_logger::init();
    log::info!("Pet ranch starting up");

    let args = Args::parse();
    if let Err(e) = app::run(&args) {
        log::error!("Fatal error: {e}");
        std::process::exit(1);
    }
}
