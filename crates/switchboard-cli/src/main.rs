// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result, bail};
use config::Config;
use runtime::Console;
use std::env;
use std::path::PathBuf;
use switchboard_api::Client;
use switchboard_prefs::PrefsStore;
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    init_tracing();

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `switchboard --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let prefs_path = config.prefs_path()?;
    if options.print_prefs_path {
        println!("{}", prefs_path.display());
        return Ok(());
    }

    let client = Client::new(config.base_url(), config.timeout()?).with_context(|| {
        format!(
            "invalid [server] config in {}; fix base_url/timeout values",
            options.config_path.display()
        )
    })?;

    let prefs = PrefsStore::open(&prefs_path).with_context(|| {
        format!(
            "open preferences {} -- if this path is wrong, set [storage].prefs_path or SWITCHBOARD_PREFS_PATH",
            prefs_path.display()
        )
    })?;
    prefs.bootstrap()?;

    if options.check_only {
        return Ok(());
    }

    let mut console = Console::new(client, &prefs, options.assume_yes)?;
    console.run(&options.command)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_prefs_path: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
    assume_yes: bool,
    command: Vec<String>,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_prefs_path: false,
        print_example: false,
        check_only: false,
        show_help: false,
        assume_yes: false,
        command: Vec::new(),
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" if options.command.is_empty() => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" if options.command.is_empty() => {
                options.print_config_path = true;
            }
            "--print-prefs-path" if options.command.is_empty() => {
                options.print_prefs_path = true;
            }
            "--print-example-config" if options.command.is_empty() => {
                options.print_example = true;
            }
            "--check" if options.command.is_empty() => {
                options.check_only = true;
            }
            "--help" | "-h" if options.command.is_empty() => {
                options.show_help = true;
            }
            "--yes" | "-y" => {
                options.assume_yes = true;
            }
            other => {
                if options.command.is_empty() && other.starts_with("--") {
                    bail!("unknown argument {other:?}; run with --help to see supported options");
                }
                options.command.push(other.to_owned());
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("switchboard -- channel list management");
    println!();
    println!("usage: switchboard [flags] <command> [args]");
    println!();
    println!("flags:");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-prefs-path       Print resolved preferences path");
    println!("  --print-example-config   Print a config template");
    println!("  --check                  Validate config + preferences + server settings");
    println!("  --yes, -y                Skip confirmation prompts");
    println!("  --help, -h               Show this help");
    println!();
    println!("commands:");
    println!("  list [--name N] [--group G] [--models M] [--key K] [--test-model T]");
    println!("       [--other O] [--tag TAG] [--type N] [--status N] [--filter-tag N]");
    println!("       [--sort [-]KEY] [--page N] [--size N]");
    println!("  copy <id>                Duplicate a channel");
    println!("  delete <id|tag:NAME>     Delete a channel, or every channel under a tag");
    println!("  delete-tag <id>          Detach a channel from its tag group");
    println!("  status <id|tag:NAME> <status>");
    println!("  priority <id|tag:NAME> <value>");
    println!("  weight <id|tag:NAME> <value>");
    println!("  test <id> [--model M]    Run a connectivity test");
    println!("  tag-status <tag> <status>");
    println!("  batch-delete <id>...     Delete several channels (asks for confirmation)");
    println!("  lookups                  Show the server's groups, models, and tags");
    println!("  test-all                 Start a server-side test of every channel");
    println!("  update-balances          Refresh every channel balance");
    println!("  purge-disabled           Delete every disabled channel");
}
