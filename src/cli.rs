//! CLI argument parsing.
use crate::capture::{DEFAULT_VERSION_OUT, DEFAULT_VERSION_PROGRAM};
use crate::config::LOCAL_CONFIG_FILE;
use crate::rules::MODERNIZATION_RULE_SET;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "modverify",
    version,
    about = "Drive the jansson build toolchain and check modernized sources",
    after_help = "Commands:\n  run <pipeline>        Run a build/test pipeline, stopping at the first failure\n  check [rule-set]      Check a source file against a conformance rule set\n  capture-version       Write `cmake --version` output to test.txt\n  doctor [pipeline]     Verify the programs pipelines need are installed\n  init                  Write the default config to modverify.json\n  list                  Show configured pipelines and rule sets\n\nExamples:\n  modverify run coverage\n  modverify run demo --show-output\n  modverify check\n  modverify check modernization --file jansson-cpp/src/dump.cpp --json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Config file (default: ./modverify.json, then the user config dir, then built-ins)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Emit debug logs on stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Run(RunArgs),
    Check(CheckArgs),
    CaptureVersion(CaptureVersionArgs),
    Doctor(DoctorArgs),
    Init(InitArgs),
    /// List configured pipelines and rule sets
    List,
}

#[derive(Parser, Debug)]
#[command(about = "Run a pipeline, stopping at the first failing step")]
pub struct RunArgs {
    /// Pipeline name (see `modverify list`)
    #[arg(value_name = "PIPELINE")]
    pub pipeline: String,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,

    /// Include each step's stdout in the report
    #[arg(long)]
    pub show_output: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Check a source file against a conformance rule set")]
pub struct CheckArgs {
    /// Rule set name
    #[arg(value_name = "RULE_SET", default_value = MODERNIZATION_RULE_SET)]
    pub rule_set: String,

    /// Check this file instead of the rule set's target
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Save a program's --version output to a file")]
pub struct CaptureVersionArgs {
    /// Program to query
    #[arg(long, value_name = "BIN", default_value = DEFAULT_VERSION_PROGRAM)]
    pub program: String,

    /// Output file (overwritten)
    #[arg(long, value_name = "PATH", default_value = DEFAULT_VERSION_OUT)]
    pub out: PathBuf,
}

#[derive(Parser, Debug)]
#[command(about = "Check that the programs pipelines invoke are installed")]
pub struct DoctorArgs {
    /// Limit the check to one pipeline
    #[arg(value_name = "PIPELINE")]
    pub pipeline: Option<String>,
}

#[derive(Parser, Debug)]
#[command(about = "Write the default config file")]
pub struct InitArgs {
    /// Destination path
    #[arg(long, value_name = "PATH", default_value = LOCAL_CONFIG_FILE)]
    pub out: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}
