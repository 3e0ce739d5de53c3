mod host;

use std::{env, path::Path, process};

use env_logger::{Builder, Env};

const ENV_LOG: &str = "SEARCHBAR_LOG";
const ENV_LOG_STYLE: &str = "SEARCHBAR_LOG_STYLE";

fn main() {
    // Setup logging from the env variables, with defaults.
    Builder::from_env(
        Env::new()
            .filter_or(ENV_LOG, "info")
            .write_style(ENV_LOG_STYLE),
    )
    .init();

    let args: Vec<String> = env::args().collect();
    let Some(config_path) = args.get(1) else {
        eprintln!("usage: searchbar-cli <config.json>");
        process::exit(2);
    };

    if let Err(err) = host::run(Path::new(config_path)) {
        log::error!("{}", err);
        process::exit(1);
    }
}
