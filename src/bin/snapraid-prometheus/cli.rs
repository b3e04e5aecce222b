use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{crate_version, value_parser};
use clap::{Arg, ArgAction, ArgMatches, Command};

use snapraid_prometheus::config::DEFAULT_OUTPUT_DIR;
use snapraid_prometheus::{Config, Output, ReportKind, Source};

#[derive(Debug)]
pub struct Arguments {
    pub report: ReportKind,
    pub input: Option<PathBuf>,
    pub snapraid: String,
    pub sudo: bool,
    pub output_dir: PathBuf,
    pub create_output_dir: bool,
    pub stdout: bool,
    pub verbose: u8,
}

impl Arguments {
    pub fn config(&self) -> Config {
        let source = match &self.input {
            Some(path) if path.as_os_str() == "-" => Source::Stdin,
            Some(path) => Source::File(path.clone()),
            None => Source::Command {
                program: self.snapraid.clone(),
                sudo: self.sudo,
            },
        };

        let output = if self.stdout {
            Output::Stdout
        } else {
            Output::Directory {
                path: self.output_dir.clone(),
                create: self.create_output_dir,
            }
        };

        Config { source, output }
    }
}

impl TryFrom<ArgMatches> for Arguments {
    type Error = anyhow::Error;

    fn try_from(args: ArgMatches) -> Result<Self, Self::Error> {
        let report = args
            .get_one::<String>("report")
            .with_context(|| "no report argument")?
            .parse()?;

        let input = args.get_one::<PathBuf>("input").cloned();

        let snapraid = args
            .get_one::<String>("snapraid")
            .with_context(|| "no snapraid argument")?
            .clone();

        let output_dir = args
            .get_one::<PathBuf>("output-dir")
            .with_context(|| "no output directory argument")?
            .clone();

        Ok(Self {
            report,
            input,
            snapraid,
            sudo: args.get_flag("sudo"),
            output_dir,
            create_output_dir: args.get_flag("create-output-dir"),
            stdout: args.get_flag("stdout"),
            verbose: args.get_count("verbose"),
        })
    }
}

pub fn args() -> Result<Arguments> {
    let arguments = build().get_matches();
    let arguments = Arguments::try_from(arguments)?;
    Ok(arguments)
}

pub fn build() -> Command {
    let report = Arg::new("report")
        .required(true)
        .value_parser(ReportKind::ALL.map(|kind| kind.subcommand()))
        .help("report to export")
        .long_help("Report to export. Selects the snapraid command and the output file name.");

    let input = Arg::new("input")
        .short('i')
        .long("input")
        .value_name("FILE")
        .env("SNAPRAID_INPUT_FILE")
        .value_parser(value_parser!(PathBuf))
        .help("read a captured report")
        .long_help(
            "Read a captured report instead of running snapraid. Use - to \
             read from STDIN.",
        );

    let snapraid = Arg::new("snapraid")
        .long("snapraid")
        .value_name("PROGRAM")
        .env("SNAPRAID_BIN")
        .default_value("snapraid")
        .help("snapraid program");

    let sudo = Arg::new("sudo")
        .long("sudo")
        .action(ArgAction::SetTrue)
        .help("run snapraid via sudo");

    let output_dir = Arg::new("output-dir")
        .short('o')
        .long("output-dir")
        .value_name("DIR")
        .env("TEXTFILE_DIRECTORY")
        .default_value(DEFAULT_OUTPUT_DIR)
        .value_parser(value_parser!(PathBuf))
        .help("textfile collector directory");

    let create_output_dir = Arg::new("create-output-dir")
        .long("create-output-dir")
        .action(ArgAction::SetTrue)
        .help("create output directory if missing");

    let stdout = Arg::new("stdout")
        .long("stdout")
        .action(ArgAction::SetTrue)
        .help("print metrics instead of writing a file");

    let verbose = Arg::new("verbose")
        .short('v')
        .long("verbose")
        .action(ArgAction::Count)
        .help("increase log verbosity")
        .long_help(
            "Increase log verbosity. Once for debug, twice for trace. Logs \
             go to STDERR.",
        );

    let help = Arg::new("help")
        .short('?')
        .long("help")
        .action(ArgAction::Help)
        .help("print help")
        .long_help("Print help.");

    let version = Arg::new("version")
        .long("version")
        .action(ArgAction::Version)
        .hide_short_help(true)
        .long_help("Print version.");

    Command::new("snapraid-prometheus")
        .about("snapraid to prometheus")
        .version(crate_version!())
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg(report)
        .arg(input)
        .arg(snapraid)
        .arg(sudo)
        .arg(output_dir)
        .arg(create_output_dir)
        .arg(stdout)
        .arg(verbose)
        .arg(help)
        .arg(version)
}
