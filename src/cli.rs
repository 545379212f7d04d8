//! Clap command definition for the `ssiprobe` binary.

use clap::{Arg, ArgAction, Command};

/// Build the command line interface.
pub fn build_cli() -> Command {
    Command::new("ssiprobe")
        .about("Reproduce isolation anomalies and check that serializable isolation catches them")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Config file (default: ./ssiprobe.toml if present)"),
        )
        .arg(
            Arg::new("isolation")
                .long("isolation")
                .short('i')
                .help("Isolation level: read-committed, repeatable-read, serializable"),
        )
        .arg(
            Arg::new("scenario")
                .long("scenario")
                .short('s')
                .help("Scenario to run (repeatable; default: all)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("repeat")
                .long("repeat")
                .short('n')
                .help("Runs per scenario")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new("barrier-timeout-ms")
                .long("barrier-timeout-ms")
                .help("Abandon a role that takes longer than this to reach a barrier")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print one JSON line per run")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list")
                .long("list")
                .help("List the scenario catalog and exit")
                .action(ArgAction::SetTrue),
        )
}
