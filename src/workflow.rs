//! Command handlers. Each returns the process exit code on completion;
//! errors are reserved for problems with the tool's own inputs.
use crate::capture::capture_version;
use crate::cli::{CaptureVersionArgs, CheckArgs, Command, DoctorArgs, InitArgs, RootArgs, RunArgs};
use crate::config::{default_config, resolve_config, write_config, ConfigSource, LoadedConfig};
use crate::conformance::{check_file, ConformanceError};
use crate::doctor::check_tools;
use crate::pipeline::CancelToken;
use crate::report::{self, Summary};
use crate::runner::SystemRunner;
use anyhow::{anyhow, Result};
use std::env;
use std::fmt::Write as _;

pub fn dispatch(args: RootArgs) -> Result<i32> {
    let config_path = args.config;
    let load = || -> Result<LoadedConfig> {
        let loaded = resolve_config(config_path.as_deref())?;
        tracing::debug!(source = %loaded.source, "config loaded");
        Ok(loaded)
    };
    match args.command {
        Command::Run(run) => run_pipeline(&load()?, run),
        Command::Check(check) => run_check(&load()?, check),
        Command::Doctor(doctor) => run_doctor(&load()?, doctor),
        Command::List => run_list(&load()?),
        Command::Init(init) => run_init(init),
        Command::CaptureVersion(capture) => run_capture_version(capture),
    }
}

fn emit(summary: Summary) -> i32 {
    print!("{}", summary.text);
    if !summary.text.ends_with('\n') {
        println!();
    }
    summary.exit_code
}

pub fn run_pipeline(loaded: &LoadedConfig, args: RunArgs) -> Result<i32> {
    let pipeline = loaded.config.pipeline(&args.pipeline)?;
    let outcome = pipeline.execute(&SystemRunner, &CancelToken::new());
    let summary = if args.json {
        report::pipeline_json(&outcome)?
    } else {
        report::summarize_pipeline(&outcome, args.show_output)
    };
    Ok(emit(summary))
}

pub fn run_check(loaded: &LoadedConfig, args: CheckArgs) -> Result<i32> {
    let rule_set = loaded.config.rule_set(&args.rule_set)?;
    let target = args.file.unwrap_or(rule_set.target);
    let results = match check_file(&target, &rule_set.predicates) {
        Ok(results) => results,
        Err(err @ ConformanceError::MissingTargetFile { .. }) => {
            eprintln!("Error: {err}");
            return Ok(1);
        }
        Err(err) => return Err(err.into()),
    };
    let summary = if args.json {
        report::checks_json(&rule_set.name, &target, &results)?
    } else {
        report::summarize_checks(&rule_set.name, &target, &results)
    };
    Ok(emit(summary))
}

pub fn run_capture_version(args: CaptureVersionArgs) -> Result<i32> {
    let result = capture_version(&SystemRunner, &args.program, &args.out)?;
    if result.succeeded() {
        println!(
            "Created {} with {} version output",
            args.out.display(),
            args.program
        );
        return Ok(0);
    }
    println!("Failed to query {} version (exit {})", args.program, result.exit_code);
    if !result.stderr.trim().is_empty() {
        println!("Error: {}", result.stderr.trim_end());
    }
    Ok(1)
}

pub fn run_doctor(loaded: &LoadedConfig, args: DoctorArgs) -> Result<i32> {
    let pipelines = match &args.pipeline {
        Some(name) => vec![loaded.config.pipeline(name)?],
        None => loaded
            .config
            .pipelines
            .keys()
            .map(|name| loaded.config.pipeline(name))
            .collect::<Result<Vec<_>>>()?,
    };
    Ok(emit(report::summarize_tools(&check_tools(&pipelines))))
}

pub fn run_init(args: InitArgs) -> Result<i32> {
    if args.out.exists() && !args.force {
        return Err(anyhow!(
            "config already exists at {} (use --force to overwrite)",
            args.out.display()
        ));
    }
    write_config(&args.out, &default_config())?;
    println!("wrote {}", args.out.display());
    Ok(0)
}

pub fn run_list(loaded: &LoadedConfig) -> Result<i32> {
    let config = &loaded.config;
    let cwd = env::current_dir().ok();
    let source = match &loaded.source {
        ConfigSource::File(path) => cwd
            .as_deref()
            .and_then(|cwd| path.strip_prefix(cwd).ok())
            .unwrap_or(path)
            .display()
            .to_string(),
        built_in => built_in.to_string(),
    };

    let mut text = String::new();
    let _ = writeln!(text, "Config: {source}");
    let _ = writeln!(text);
    let _ = writeln!(text, "Pipelines:");
    for (name, pipeline) in &config.pipelines {
        let _ = writeln!(
            text,
            "  {name:<14} {:>2} steps  {}",
            pipeline.steps.len(),
            pipeline.description.as_deref().unwrap_or("")
        );
    }
    let _ = writeln!(text);
    let _ = writeln!(text, "Rule sets:");
    for (name, rule_set) in &config.rule_sets {
        let _ = writeln!(
            text,
            "  {name:<14} {:>2} rules  {}",
            rule_set.rules.len(),
            rule_set.target
        );
    }
    print!("{text}");
    Ok(0)
}
