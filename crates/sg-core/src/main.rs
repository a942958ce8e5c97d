//! safeguard command-line front end.
//!
//! Judges untrusted values from scripts and pipelines:
//! - `validate` checks a value against a type from the rules file
//! - `check-dir` checks a directory path for containment
//! - `check-redirect` checks a redirect target against allowed origins
//! - `redact` masks sensitive keys in a JSON document
//! - `check-config` loads and compiles configuration

use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand};
use sg_core::audit;
use sg_core::config::{resolve_redaction_policy, resolve_rules, ConfigSource, RULES_FILENAME};
use sg_core::exit_codes::ExitCode;
use sg_core::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use sg_core::output::{ErrorReport, OutputFormat, Verdict};
use sg_core::{CliError, Result};
use sg_redact::{RedactionPolicy, Redactor};
use sg_validate::{Canonicalizer, RulesConfig, Validated, Validator, CANONICALIZATION_VERSION};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// safeguard - validate, canonicalize and redact untrusted input
#[derive(Parser)]
#[command(name = "sg-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Rules file (JSON); see also SG_RULES and SG_CONFIG_DIR
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Also decode HTML character references during canonicalization
    #[arg(long, global = true)]
    decode_html: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format on stderr (human, jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a value against a registered type
    Validate(ValidateArgs),

    /// Check that a directory path is canonical and inside a parent directory
    CheckDir(CheckDirArgs),

    /// Check a redirect target against the configured origins
    CheckRedirect(CheckRedirectArgs),

    /// Mask sensitive keys in a JSON document
    Redact(RedactArgs),

    /// Load and compile configuration, then report what was found
    CheckConfig(CheckConfigArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Value to check; read from stdin when omitted
    input: Option<String>,

    /// Field label used in messages
    #[arg(long, default_value = "input")]
    context: String,

    /// Accept an empty value
    #[arg(long)]
    allow_null: bool,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// Type name from the rules file
    #[arg(long = "type", short = 't')]
    type_name: String,

    /// Maximum length in characters
    #[arg(long, default_value_t = 4096)]
    max_length: usize,

    #[command(flatten)]
    input: InputArgs,
}

#[derive(Args, Debug)]
struct CheckDirArgs {
    /// Directory the path must be inside of
    #[arg(long)]
    parent: PathBuf,

    #[command(flatten)]
    input: InputArgs,
}

#[derive(Args, Debug)]
struct CheckRedirectArgs {
    #[command(flatten)]
    input: InputArgs,
}

#[derive(Args, Debug)]
struct RedactArgs {
    /// JSON document, or - for stdin
    #[arg(default_value = "-")]
    file: PathBuf,

    /// Redaction policy file; see also SG_REDACTION_POLICY
    #[arg(long)]
    policy: Option<PathBuf>,

    /// Sensitive key (repeatable); replaces the policy's key list
    #[arg(long = "key", short = 'k')]
    keys: Vec<String>,

    /// Replacement string
    #[arg(long)]
    mask: Option<String>,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,
}

#[derive(Args, Debug)]
struct CheckConfigArgs {
    /// Redaction policy file to check as well
    #[arg(long)]
    policy: Option<PathBuf>,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::Accepted,
                _ => ExitCode::ArgsError,
            };
            let _ = err.print();
            std::process::exit(code.as_i32());
        }
    };

    let verbosity = if cli.global.quiet {
        Some(LogLevel::Error)
    } else {
        match cli.global.verbose {
            0 => None,
            1 => Some(LogLevel::Info),
            2 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    };
    let log_config = LogConfig::from_env(cli.global.log_level.or(verbosity), cli.global.log_format);
    if let Err(e) = init_logging(&log_config) {
        eprintln!("warning: logging not initialized: {e}");
    }

    let result = match &cli.command {
        Commands::Validate(args) => run_validate(&cli.global, args),
        Commands::CheckDir(args) => run_check_dir(&cli.global, args),
        Commands::CheckRedirect(args) => run_check_redirect(&cli.global, args),
        Commands::Redact(args) => run_redact(&cli.global, args),
        Commands::CheckConfig(args) => run_check_config(&cli.global, args),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(code = e.code(), error = %e, "command failed");
            eprintln!("{}", ErrorReport::new(&e).render(cli.global.format));
            e.exit_code()
        }
    };

    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Commands
// ============================================================================

fn run_validate(global: &GlobalOpts, args: &ValidateArgs) -> Result<ExitCode> {
    let validator = load_validator(global)?;
    let input = read_input(&args.input)?;
    let result = validator.get_valid_input(
        &args.input.context,
        &input,
        &args.type_name,
        args.max_length,
        args.input.allow_null,
    );
    emit_verdict(global, &result)
}

fn run_check_dir(global: &GlobalOpts, args: &CheckDirArgs) -> Result<ExitCode> {
    let validator = load_validator(global)?;
    let input = read_input(&args.input)?;
    let result = validator
        .validate_directory(
            &args.input.context,
            &input,
            &args.parent,
            args.input.allow_null,
        )
        .map(|dir| dir.map(|p| p.display().to_string()));
    emit_verdict(global, &result)
}

fn run_check_redirect(global: &GlobalOpts, args: &CheckRedirectArgs) -> Result<ExitCode> {
    let validator = load_validator(global)?;
    let input = read_input(&args.input)?;
    let result = validator.validate_redirect(&args.input.context, &input, args.input.allow_null);
    emit_verdict(global, &result)
}

fn run_redact(_global: &GlobalOpts, args: &RedactArgs) -> Result<ExitCode> {
    let mut policy = if args.keys.is_empty() {
        match resolve_redaction_policy(args.policy.as_deref()) {
            Some(resolved) => {
                tracing::info!(path = %resolved.path.display(), source = %resolved.source, "loading redaction policy");
                RedactionPolicy::load(&resolved.path)?
            }
            None => RedactionPolicy::default(),
        }
    } else {
        RedactionPolicy::with_keys(args.keys.iter().cloned())
    };
    if let Some(mask) = &args.mask {
        policy = policy.mask(mask.clone());
    }
    let redactor = Redactor::new(&policy)?;

    let content = read_document(&args.file)?;
    let mut tree: serde_json::Value =
        serde_json::from_str(&content).map_err(CliError::InputJson)?;
    redactor.redact_in_place(&mut tree);

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&tree)
    } else {
        serde_json::to_string(&tree)
    }
    .map_err(CliError::Output)?;
    println!("{rendered}");
    Ok(ExitCode::Accepted)
}

fn run_check_config(global: &GlobalOpts, args: &CheckConfigArgs) -> Result<ExitCode> {
    let resolved = resolve_rules(global.rules.as_deref()).ok_or_else(no_rules_file)?;
    let config = RulesConfig::load(&resolved.path)?;
    let validator = Validator::from_config(&config)?.with_canonicalizer(canonicalizer(global));

    let policy_path = resolve_redaction_policy(args.policy.as_deref());
    let policy = match &policy_path {
        Some(resolved) => RedactionPolicy::load(&resolved.path)?,
        None => RedactionPolicy::default(),
    };
    Redactor::new(&policy)?;

    let redirect = validator.redirect_policy();
    let report = serde_json::json!({
        "status": "ok",
        "rules": {
            "path": resolved.path.display().to_string(),
            "source": resolved.source.to_string(),
            "schema_version": config.schema_version,
            "types": validator.registry().type_names(),
        },
        "redirect": {
            "self_origin": redirect.self_origin().map(ToString::to_string),
            "allowed_origins": redirect.allowed_origins().iter().map(ToString::to_string).collect::<Vec<_>>(),
        },
        "redaction": {
            "path": policy_path.as_ref().map(|p| p.path.display().to_string()),
            "source": policy_path.as_ref().map_or(ConfigSource::BuiltinDefault, |p| p.source).to_string(),
            "sensitive_keys": policy.sensitive_keys,
            "case_insensitive": policy.case_insensitive,
        },
        "canonicalization": {
            "version": CANONICALIZATION_VERSION,
            "codecs": validator.canonicalizer().codec_names(),
        },
    });

    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(&report).map_err(CliError::Output)?)
        }
        OutputFormat::Summary => println!(
            "ok: {} types from {} ({})",
            validator.registry().len(),
            resolved.path.display(),
            resolved.source
        ),
    }
    Ok(ExitCode::Accepted)
}

// ============================================================================
// Helpers
// ============================================================================

fn no_rules_file() -> CliError {
    CliError::NoRulesFile(format!("/etc/safeguard/{RULES_FILENAME}"))
}

fn canonicalizer(global: &GlobalOpts) -> Canonicalizer {
    if global.decode_html {
        Canonicalizer::web()
    } else {
        Canonicalizer::new()
    }
}

fn load_validator(global: &GlobalOpts) -> Result<Validator> {
    let resolved = resolve_rules(global.rules.as_deref()).ok_or_else(no_rules_file)?;
    tracing::info!(path = %resolved.path.display(), source = %resolved.source, "loading rules");
    Ok(Validator::load(&resolved.path)?.with_canonicalizer(canonicalizer(global)))
}

/// Positional input, or stdin without its trailing line break.
fn read_input(args: &InputArgs) -> Result<String> {
    if let Some(input) = &args.input {
        return Ok(input.clone());
    }
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .map_err(|source| CliError::Io {
            path: PathBuf::from("<stdin>"),
            source,
        })?;
    if buf.ends_with('\n') {
        buf.pop();
        if buf.ends_with('\r') {
            buf.pop();
        }
    }
    Ok(buf)
}

fn read_document(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|source| CliError::Io {
                path: PathBuf::from("<stdin>"),
                source,
            })?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn emit_verdict(global: &GlobalOpts, result: &Validated<String>) -> Result<ExitCode> {
    if let Err(rejection) = result {
        audit::record(rejection);
    }
    let verdict = Verdict::from_validated(result);
    println!("{}", verdict.render(global.format)?);
    Ok(verdict.exit_code())
}
