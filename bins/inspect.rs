//! Prints the augmented configuration and the registered metric groups for
//! a game id, without touching the Python side of the workspace.

use std::path::PathBuf;

use utils::metrics::configure_logger;
use utils::options::{augment_options, config_to_string, Opt};
use utils::panic_hook;

fn main() {
    panic_hook::init();
    tracing_subscriber::fmt::init();

    let args = std::env::args().collect::<Vec<String>>();
    let game = match args.as_slice() {
        [_] => "MiniGrid-Empty-8x8-v0".to_owned(),
        [_, game] => game.clone(),
        _ => panic!("usage: inspect [game-id]"),
    };

    let opt = Opt::builder()
        .game(game)
        .hist_len(4)
        .device("cpu".to_owned())
        .subset(3)
        .out_dir(PathBuf::from("results"))
        .build();
    let opt = augment_options(opt).unwrap();

    println!("{}", config_to_string(&opt.to_map(), 0, true));

    let mut registry = configure_logger(&opt).unwrap();
    for group in ["train", "test"] {
        let names = registry.group(group).metric_names().join(", ");
        println!("{group}: {names}");
    }
    registry.close().unwrap();
}
