//! CLI argument definitions for `clipmix`.

use clap::{Arg, ArgAction, Command};

/// Build the CLI argument parser and command definitions.
pub fn build_cli() -> Command {
    Command::new("clipmix")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Mix sound clips into a live microphone feed")
        .arg_required_else_help(true)
        .args_conflicts_with_subcommands(true)
        .arg(
            Arg::new("input")
                .long("input")
                .short('i')
                .value_name("NAME")
                .help("Capture device name (default input device if omitted)"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .value_name("NAME")
                .help("Playback device name, e.g. a virtual cable (default output if omitted)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("PATH")
                .help("Path to an engine config JSON file"),
        )
        .arg(
            Arg::new("sample-rate")
                .long("sample-rate")
                .value_name("HZ")
                .help("Engine sample rate, overrides the config file"),
        )
        .arg(
            Arg::new("block-size")
                .long("block-size")
                .value_name("FRAMES")
                .help("Frames mixed per block, overrides the config file"),
        )
        .arg(
            Arg::new("fade-out-ms")
                .long("fade-out-ms")
                .value_name("MS")
                .help("Fade applied to the end of every clip"),
        )
        .arg(
            Arg::new("mic-volume")
                .long("mic-volume")
                .short('m')
                .value_name("GAIN")
                .default_value("1.0")
                .help("Initial mic gain (0.0-1.5)"),
        )
        .arg(
            Arg::new("mute")
                .long("mute")
                .action(ArgAction::SetTrue)
                .help("Start with the mic muted"),
        )
        .arg(
            Arg::new("monitor")
                .long("monitor")
                .action(ArgAction::SetTrue)
                .help("Also play clips on the default output device"),
        )
        .arg(
            Arg::new("volume")
                .long("volume")
                .short('v')
                .value_name("GAIN")
                .default_value("1.0")
                .help("Volume for every triggered clip"),
        )
        .arg(
            Arg::new("SOUND")
                .help("Sound files bound to keys 1-9 in order")
                .num_args(1..)
                .index(1),
        )
        .subcommand(Command::new("devices").about("List input and output devices"))
        .subcommand(
            Command::new("decode")
                .about("Decode and resample a file, then print a JSON summary")
                .arg(
                    Arg::new("INPUT")
                        .help("The audio file to decode")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("sample-rate")
                        .long("sample-rate")
                        .value_name("HZ")
                        .help("Target sample rate (engine default if omitted)"),
                ),
        )
        .subcommand(
            Command::new("create")
                .about("Emit default JSON payloads")
                .subcommand_required(true)
                .subcommand(
                    Command::new("config-json").about("Print the default engine config JSON"),
                ),
        )
}
