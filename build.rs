// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn build_cli() -> Command {
    Command::new("wheel2conda")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert a pure-Python wheel into conda packages")
        .arg(Arg::new("wheel").required(true).help("Path to the .whl file"))
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("output_dir")
                .short('o')
                .long("output-dir")
                .value_name("DIR")
                .help("Directory for the {platform}-{bitness} output directories"),
        )
        .arg(
            Arg::new("launcher_dir")
                .long("launcher-dir")
                .value_name("DIR")
                .help("Directory holding cli-64.exe and cli-32.exe Windows launchers (default: $WHEEL2CONDA_LAUNCHER_DIR, then the install share directory)"),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .help("Number of packages to build in parallel"),
        )
        .arg(
            Arg::new("keep_going")
                .short('k')
                .long("keep-going")
                .action(ArgAction::SetTrue)
                .help("Keep building remaining targets after a failure"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable debug logging"),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("wheel2conda.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
