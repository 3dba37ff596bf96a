use calscrape::handlers::{
    handle_courses, handle_extract, handle_init, handle_programs, handle_requirements,
    handle_vitals, print_banner,
};
use colored::Colorize;
use commands::command_argument_builder;
use tracing_subscriber::EnvFilter;

mod commands;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    if !quiet {
        print_banner();
    }

    let result = match chosen_command.subcommand() {
        None => return,
        Some(("init", primary_command)) => handle_init(primary_command),
        Some(("programs", primary_command)) => handle_programs(primary_command, quiet).await,
        Some(("vitals", primary_command)) => handle_vitals(primary_command, quiet).await,
        Some(("courses", primary_command)) => handle_courses(primary_command, quiet).await,
        Some(("requirements", primary_command)) => handle_requirements(primary_command, quiet).await,
        Some(("extract", primary_command)) => handle_extract(primary_command),
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
