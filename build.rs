// build.rs

use clap::{Arg, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn build_cli() -> Command {
    Command::new("codeshift")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Codeshift Contributors")
        .about("Move the editor from the snap package to the vendor apt repository")
        .long_about(
            "Backs up the editor's configuration and extensions, removes the snap, installs \
             the package from the vendor apt repository, restores the backup, reinstalls \
             extensions, and applies terminal settings. Runs the migration when no \
             subcommand is given.",
        )
        .subcommand_required(false)
        .subcommand(Command::new("migrate").about("Run the full migration (the default)"))
        .subcommand(
            Command::new("shell-integration")
                .about("Write the editor launcher function and completions for a shell")
                .arg(
                    Arg::new("shell")
                        .short('s')
                        .long("shell")
                        .value_parser(["bash", "zsh", "fish"])
                        .help("Shell to target (default: configured shell, then $SHELL)"),
                ),
        )
        .subcommand(
            Command::new("audit")
                .about("Summarize recent chat CLI audit sessions")
                .arg(
                    Arg::new("dir")
                        .short('d')
                        .long("dir")
                        .value_name("PATH")
                        .help("Audit directory (default: auto-detected)"),
                )
                .arg(
                    Arg::new("limit")
                        .short('l')
                        .long("limit")
                        .default_value("5")
                        .help("Number of sessions to show, newest first"),
                ),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completions for codeshift")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "zsh", "fish", "powershell", "elvish"])
                        .help("Shell type"),
                ),
        )
        .subcommand(Command::new("config").about("Print the effective configuration as TOML"))
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

    let man_path = manifest_dir.join("man").join("codeshift.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
