//! Command-line surface of the `spd` binary

use crate::config::{Registry, DEFAULT_REGISTRY};
use crate::report::{render_identifier, render_json, render_template, render_text};
use crate::run::{validate_project, validate_single};
use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use spd_ident::IdentifierResolver;
use spd_template::{TemplateCache, ValidationReport};
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit code when no errors were found
pub const EXIT_OK: u8 = 0;
/// Exit code when validation found errors
pub const EXIT_INVALID: u8 = 1;
/// Exit code when the run could not be configured
pub const EXIT_CONFIG: u8 = 2;

fn json_flag() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Output as JSON")
}

/// Build the argument parser
#[must_use]
pub fn command() -> Command {
    Command::new("spd")
        .version(crate::VERSION)
        .about("Validate marker-based templates, artifacts and identifier traceability")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug-level logging (overridden by RUST_LOG)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("validate")
                .about("Validate every artifact listed in the registry")
                .arg(
                    Arg::new("registry")
                        .long("registry")
                        .default_value(DEFAULT_REGISTRY)
                        .value_parser(value_parser!(PathBuf))
                        .help("Registry file"),
                )
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("template")
                .about("Load a template and list its blocks")
                .arg(
                    Arg::new("path")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Template file"),
                ),
        )
        .subcommand(
            Command::new("artifact")
                .about("Validate one artifact against one template")
                .arg(
                    Arg::new("template")
                        .long("template")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Template file"),
                )
                .arg(
                    Arg::new("path")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Artifact file"),
                )
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("parse-id")
                .about("Decompose an identifier against registered systems")
                .arg(Arg::new("id").required(true).help("Identifier"))
                .arg(
                    Arg::new("kind")
                        .long("kind")
                        .required(true)
                        .help("Expected identifier kind"),
                )
                .arg(
                    Arg::new("system")
                        .long("system")
                        .action(ArgAction::Append)
                        .help("Registered system (repeatable)"),
                ),
        )
}

fn print_report(report: &ValidationReport, json: bool) -> Result<()> {
    if json {
        println!("{}", render_json(report).context("serializing report")?);
    } else {
        print!("{}", render_text(report));
    }
    Ok(())
}

fn verdict(report: &ValidationReport) -> ExitCode {
    ExitCode::from(if report.is_ok() { EXIT_OK } else { EXIT_INVALID })
}

fn path_arg<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a PathBuf> {
    args.get_one::<PathBuf>(name)
        .with_context(|| format!("missing argument '{name}'"))
}

/// Run the selected subcommand
///
/// # Errors
/// Returns an error when the run cannot be configured (exit code 2).
pub fn execute(matches: &ArgMatches) -> Result<ExitCode> {
    let cache = TemplateCache::default();

    match matches.subcommand() {
        Some(("validate", args)) => {
            let path = path_arg(args, "registry")?;
            let registry = Registry::load(path)
                .with_context(|| format!("loading registry {}", path.display()))?;
            let summary = validate_project(&registry, &cache);
            print_report(&summary.report, args.get_flag("json"))?;
            Ok(verdict(&summary.report))
        }
        Some(("template", args)) => {
            let path = path_arg(args, "path")?;
            match cache.load(path) {
                Ok(template) => {
                    print!("{}", render_template(&template));
                    Ok(ExitCode::from(EXIT_OK))
                }
                Err(e) => {
                    let report = ValidationReport {
                        errors: e.into_issues(),
                        warnings: Vec::new(),
                    };
                    print_report(&report, false)?;
                    Ok(ExitCode::from(EXIT_INVALID))
                }
            }
        }
        Some(("artifact", args)) => {
            let template = path_arg(args, "template")?;
            let artifact = path_arg(args, "path")?;
            let report = validate_single(template, artifact, &cache).unwrap_or_else(|issues| {
                ValidationReport {
                    errors: issues,
                    warnings: Vec::new(),
                }
            });
            print_report(&report, args.get_flag("json"))?;
            Ok(verdict(&report))
        }
        Some(("parse-id", args)) => {
            let id = args.get_one::<String>("id").context("missing identifier")?;
            let kind = args.get_one::<String>("kind").context("missing kind")?;
            let systems = args
                .get_many::<String>("system")
                .into_iter()
                .flatten()
                .cloned();
            let resolver = IdentifierResolver::new(systems, None::<Vec<String>>);
            match resolver.resolve(id, kind, None) {
                Some(parsed) => {
                    print!("{}", render_identifier(&parsed));
                    Ok(ExitCode::from(EXIT_OK))
                }
                None => {
                    println!("'{id}' does not resolve as kind '{kind}'");
                    Ok(ExitCode::from(EXIT_INVALID))
                }
            }
        }
        _ => Ok(ExitCode::from(EXIT_CONFIG)),
    }
}
