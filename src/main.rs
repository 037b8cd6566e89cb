use std::path::PathBuf;
use std::process;

use glowfall::AnimationConfig;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Optional first argument: path to a JSON config
    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => match AnimationConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{}: {}", path.display(), e);
                process::exit(1);
            }
        },
        None => AnimationConfig::default(),
    };

    if let Err(e) = glowfall::run(config) {
        log::error!("{}", e);
        process::exit(1);
    }
}
