use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};

use booklint_core::{
    CheckPlan, compute_exit_code, render_json, render_plain, render_summary, render_table,
    run_targets,
};
use booklint_domain::{Overrides, RuleCatalog, RuleDefinition};
use booklint_types::{DEFAULT_IGNORE_FILE, FailOn, IgnoreFile};

#[derive(Parser)]
#[command(name = "booklint")]
#[command(about = "Lint ebook source trees", long_about = None)]
struct Cli {
    /// Enable verbose (info-level) logging to stderr.
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Enable debug-level logging to stderr.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check one or more ebook source directories.
    Check(CheckArgs),

    /// List the built-in rule catalog.
    Rules(RulesArgs),

    /// Show detailed information about a single rule.
    Explain(ExplainArgs),

    /// Print the JSON Schema of the ignore manifest.
    IgnoreSchema,
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Ebook source directories, checked in the order given.
    #[arg(required = true, num_args = 1.., value_name = "TARGET")]
    targets: Vec<PathBuf>,

    /// Print tab-separated `code<TAB>file<TAB>message` lines.
    #[arg(long, short = 'p', conflicts_with = "json")]
    plain: bool,

    /// Print the full run report as JSON once all targets finish.
    #[arg(long)]
    json: bool,

    /// Ignore every target's ignore manifest.
    #[arg(long, short = 's')]
    skip_ignore: bool,

    /// Report these codes even when an ignore entry matches them (repeatable,
    /// comma-separated).
    #[arg(
        long,
        short = 'a',
        value_delimiter = ',',
        action = clap::ArgAction::Append,
        value_name = "CODE"
    )]
    allow: Vec<String>,

    /// Lowest finding severity that fails the run.
    #[arg(long, value_enum, default_value_t = FailOnArg::Error)]
    fail_on: FailOnArg,

    /// Evaluate rules on a single thread.
    #[arg(long)]
    sequential: bool,

    /// Name of the ignore manifest looked up in each target root.
    #[arg(long, default_value = DEFAULT_IGNORE_FILE, value_name = "NAME")]
    ignore_file: String,
}

#[derive(Parser, Debug)]
struct RulesArgs {
    #[arg(long, value_enum, default_value_t = RulesFormat::Table)]
    format: RulesFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RulesFormat {
    Table,
    Json,
}

#[derive(Parser, Debug)]
struct ExplainArgs {
    /// Rule code, for example `s-004`.
    code: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FailOnArg {
    Error,
    Warning,
    Never,
}

impl From<FailOnArg> for FailOn {
    fn from(v: FailOnArg) -> Self {
        match v {
            FailOnArg::Error => FailOn::Error,
            FailOnArg::Warning => FailOn::Warning,
            FailOnArg::Never => FailOn::Never,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OutputMode {
    Table,
    Plain,
    Json,
}

#[cfg(not(test))]
fn main() -> std::process::ExitCode {
    match run_with_args(std::env::args_os()) {
        Ok(code) => std::process::ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::ExitCode::from(1)
        }
    }
}

fn run_with_args<I, T>(args: I) -> Result<i32>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            // Usage errors share the tool-error exit code; --help and --version exit 0.
            let code = if err.use_stderr() { 1 } else { 0 };
            err.print().context("print usage")?;
            return Ok(code);
        }
    };
    init_logging(cli.verbose, cli.debug);

    let catalog = RuleCatalog::builtin().context("build rule catalog")?;
    debug!(rules = catalog.len(), "catalog ready");

    match cli.command {
        Commands::Check(args) => cmd_check(args, &catalog),
        Commands::Rules(args) => {
            cmd_rules(&args, &catalog)?;
            Ok(0)
        }
        Commands::Explain(args) => {
            cmd_explain(&args, &catalog)?;
            Ok(0)
        }
        Commands::IgnoreSchema => {
            cmd_ignore_schema()?;
            Ok(0)
        }
    }
}

/// Initialize tracing/logging based on CLI flags.
fn init_logging(verbose: bool, debug: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    debug!("Logging initialized at level: {}", level);
}

fn cmd_check(args: CheckArgs, catalog: &RuleCatalog) -> Result<i32> {
    let allow = resolve_allow(&args.allow, catalog)?;
    let mode = if args.json {
        OutputMode::Json
    } else if args.plain {
        OutputMode::Plain
    } else {
        OutputMode::Table
    };

    let plan = CheckPlan {
        targets: args.targets,
        overrides: Overrides {
            allow,
            skip_ignore: args.skip_ignore,
        },
        parallel: !args.sequential,
        ignore_file: args.ignore_file,
        fail_on: args.fail_on.into(),
    };
    info!(
        targets = plan.targets.len(),
        parallel = plan.parallel,
        skip_ignore = plan.overrides.skip_ignore,
        fail_on = plan.fail_on.as_str(),
        "check started"
    );

    let report = run_targets(&plan, catalog, |target| match mode {
        OutputMode::Table => print!("{}", render_table(target)),
        OutputMode::Plain => print!("{}", render_plain(target)),
        OutputMode::Json => {}
    });

    match mode {
        OutputMode::Json => {
            let json = render_json(&report).context("serialize run report")?;
            println!("{json}");
        }
        OutputMode::Table => println!("\n{}", render_summary(&report)),
        OutputMode::Plain => {}
    }

    let exit_code = compute_exit_code(plan.fail_on, &report.verdict.counts);
    info!(exit_code, "check finished");
    Ok(exit_code)
}

/// Validates `--allow` codes against the catalog.
fn resolve_allow(codes: &[String], catalog: &RuleCatalog) -> Result<BTreeSet<String>> {
    let mut allow = BTreeSet::new();
    for code in codes {
        let code = code.trim();
        if code.is_empty() {
            continue;
        }
        if !catalog.contains(code) {
            bail!("{}", unknown_code_message(code, catalog));
        }
        allow.insert(code.to_string());
    }
    Ok(allow)
}

fn unknown_code_message(code: &str, catalog: &RuleCatalog) -> String {
    let mut msg = format!("Rule '{code}' not found.");
    let suggestions = catalog.similar_codes(code);
    if !suggestions.is_empty() {
        msg.push_str("\n\nDid you mean one of these?\n");
        for s in &suggestions {
            msg.push_str(&format!("  - {s}\n"));
        }
    }
    msg.push_str("\nUse 'booklint rules' to list all available rules.");
    msg
}

fn cmd_rules(args: &RulesArgs, catalog: &RuleCatalog) -> Result<()> {
    match args.format {
        RulesFormat::Table => print!("{}", format_rules_table(catalog.rules())),
        RulesFormat::Json => {
            let rules: Vec<serde_json::Value> = catalog
                .rules()
                .iter()
                .map(|rule| {
                    serde_json::json!({
                        "code": rule.code,
                        "category": rule.category,
                        "severity": rule.severity,
                        "message": rule.message,
                    })
                })
                .collect();
            let s = serde_json::to_string_pretty(&rules).context("render json")?;
            println!("{s}");
        }
    }
    Ok(())
}

fn format_rules_table(rules: &[RuleDefinition]) -> String {
    let mut out = String::new();
    for rule in rules {
        out.push_str(&format!(
            "{}  {:<7}  {:<10}  {}\n",
            rule.code,
            rule.severity.as_str(),
            rule.category.as_str(),
            rule.message
        ));
    }
    out
}

fn cmd_explain(args: &ExplainArgs, catalog: &RuleCatalog) -> Result<()> {
    match catalog.get(args.code.trim()) {
        Some(rule) => {
            print!("{}", format_rule_explanation(rule));
            Ok(())
        }
        None => bail!("{}", unknown_code_message(&args.code, catalog)),
    }
}

/// Format rule explanation for display.
fn format_rule_explanation(rule: &RuleDefinition) -> String {
    let mut out = String::new();

    out.push_str(&format!("Rule: {}\n", rule.code));
    out.push_str(&format!("Category: {}\n", rule.category.as_str()));
    out.push_str(&format!("Severity: {}\n", rule.severity.as_str()));
    out.push_str(&format!("Message: {}\n", rule.message));

    out.push_str("\nTo accept a known violation, add to booklint-ignore.toml:\n");
    out.push_str("  [[ignore]]\n");
    out.push_str(&format!("  code = \"{}\"\n", rule.code));
    out.push_str("  path = \"chapter-1.xhtml\"\n");
    out.push_str("  reason = \"...\"\n");

    out
}

fn cmd_ignore_schema() -> Result<()> {
    let schema = schemars::schema_for!(IgnoreFile);
    let s = serde_json::to_string_pretty(&schema).context("render json schema")?;
    println!("{s}");
    Ok(())
}
