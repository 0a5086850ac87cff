use particle_renderer::{app, Settings};
use std::path::PathBuf;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = match Settings::discover(std::env::args_os().nth(1).map(PathBuf::from)) {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = app::run(settings) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
