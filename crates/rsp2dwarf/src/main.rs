use std::ffi::OsString;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{command, Arg, ArgAction, ArgMatches};

fn main() {
    let matches = command!()
        .max_term_width(100)
        .args(&[
            Arg::new("input")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("The assembled microcode file. Its .dat companion supplies the data segment"),
            Arg::new("name")
                .short('n')
                .value_name("name")
                .value_parser(clap::value_parser!(String))
                .help("The symbol name prefix to use in the linker [default: derived from the input name]"),
            Arg::new("output")
                .short('o')
                .value_name("output")
                .value_parser(clap::value_parser!(PathBuf))
                .help("The output object file [default: <input>.o]"),
            Arg::new("debug")
                .short('d')
                .action(ArgAction::SetTrue)
                .help("Include debug sections built from the .sym and .dbg companion files"),
            Arg::new("verbose")
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable verbose output"),
        ])
        .try_get_matches();

    // Every failure exits with status 1 and a message on stdout, including
    // argument errors; only the help and version output exit cleanly.
    let matches = match matches {
        Ok(matches) => matches,
        Err(err)
            if err.kind() == ErrorKind::DisplayHelp || err.kind() == ErrorKind::DisplayVersion =>
        {
            print!("{}", err);
            process::exit(0);
        }
        Err(err) => {
            print!("{}", err);
            process::exit(1);
        }
    };

    if matches.get_flag("verbose") {
        env_logger::builder()
            .format_level(false)
            .format_target(false)
            .filter_module("rsp2dwarf", log::LevelFilter::Debug)
            .init();
    }

    if let Err(err) = run(&matches) {
        println!("{:#}", err);
        process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    let input = matches.get_one::<PathBuf>("input").unwrap();

    let name = matches
        .get_one::<String>("name")
        .cloned()
        .unwrap_or_else(|| rsp2dwarf::link_name_from_path(input));

    let output = matches.get_one::<PathBuf>("output").cloned().unwrap_or_else(|| {
        let mut path = OsString::from(input.as_os_str());
        path.push(".o");
        PathBuf::from(path)
    });

    let include_debug = matches.get_flag("debug");

    rsp2dwarf::convert(input, &output, &name, include_debug)
        .with_context(|| format!("Failed to convert '{}'", input.display()))
}
