use crate::CLAP_STYLING;
use clap::{arg, command};
use std::path::PathBuf;
use url::Url;

fn config_arg() -> clap::Arg {
    arg!(-c --"config" <PATH>)
        .required(false)
        .help("Config file (default: ~/.config/calscrape/config.json if present)")
        .value_parser(clap::value_parser!(PathBuf))
}

fn url_args(cmd: clap::Command, what: &str) -> clap::Command {
    cmd.arg(
        arg!(-u --"url" <URL>)
            .required(false)
            .help(format!("A single {what} page to scrape"))
            .value_parser(clap::value_parser!(Url))
            .conflicts_with("urls-file"),
    )
    .arg(
        arg!(-H --"urls-file" <PATH>)
            .required(false)
            .help(format!("Path to a newline-delimited file of {what} page URLs"))
            .value_parser(clap::value_parser!(PathBuf))
            .conflicts_with("url"),
    )
}

fn pool_args(cmd: clap::Command) -> clap::Command {
    cmd.arg(
        arg!(-t --"threads" <NUM_WORKERS>)
            .required(false)
            .help("The number of async workers fetching pages (overrides config)")
            .value_parser(clap::value_parser!(usize)),
    )
    .arg(
        arg!(--"delay-ms" <MILLIS>)
            .required(false)
            .help("Pause after each fetch, per worker (overrides config)")
            .value_parser(clap::value_parser!(u64)),
    )
    .arg(config_arg())
}

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("calscrape")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("calscrape")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner, progress bars and summaries").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Writes the default calscrape config file")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Where to write the config file")
                        .default_value("~/.config/calscrape/config.json"),
                )
                .arg(
                    arg!(-f --"force")
                        .help("Overwrite an existing config file without asking")
                        .required(false),
                ),
        )
        .subcommand(pool_args(url_args(
            command!("programs")
                .about(
                    "Split program pages into one record per specialization, merged into the \
                output file.",
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("JSON file to merge sections into")
                        .value_parser(clap::value_parser!(PathBuf))
                        .default_value("sections.json"),
                ),
            "program",
        )))
        .subcommand(pool_args(url_args(
            command!("vitals")
                .about("Read the program vitals box of each page into Major/Honours program entries")
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("JSON file to write")
                        .value_parser(clap::value_parser!(PathBuf))
                        .default_value("programs.json"),
                ),
            "program",
        )))
        .subcommand(pool_args(url_args(
            command!("courses")
                .about("Extract course entries from subject pages into CSV")
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("CSV file to write")
                        .value_parser(clap::value_parser!(PathBuf))
                        .default_value("courses.csv"),
                ),
            "subject",
        )))
        .subcommand(pool_args(
            command!("requirements")
                .about(
                    "Re-scrape the sections listed in a programs output file and attach their \
                requirement lines.",
                )
                .arg(
                    arg!(-i --"input" <PATH>)
                        .required(true)
                        .help("JSON file written by `calscrape programs`")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("JSON file to write")
                        .value_parser(clap::value_parser!(PathBuf))
                        .default_value("requirements.json"),
                )
                .arg(
                    arg!(--"ai")
                        .required(false)
                        .help("Structure requirement lines with the configured oracle")
                        .action(clap::ArgAction::SetTrue),
                ),
        ))
        .subcommand(
            command!("extract")
                .about("Run extraction on a saved HTML file and print the records as JSON")
                .arg(
                    arg!(<FILE>)
                        .help("HTML file to read")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The URL the page was saved from")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(-n --"name" <NAME>)
                        .required(false)
                        .help("Only extract the section whose heading best matches NAME"),
                )
                .arg(
                    arg!(--"courses")
                        .required(false)
                        .help("Treat the file as a subject page and print its courses")
                        .action(clap::ArgAction::SetTrue)
                        .conflicts_with("name"),
                )
                .arg(config_arg()),
        )
}
