// crates/tinly-rules-cli/src/main.rs
// ============================================================================
// Module: Tinly Rules CLI Entry Point
// Description: Command dispatcher for rule file validation and dry runs.
// Purpose: Provide an offline CLI for authoring and testing redirect rules.
// Dependencies: clap, serde, serde_json, thiserror, tinly-rules-core, toml.
// ============================================================================

//! ## Overview
//! The Tinly Rules CLI validates rule files and resolves simulated visitor
//! requests against them without touching production storage. Rule files are
//! JSON documents holding single rules and rule groups; resolver settings can
//! be supplied through a TOML config file. Inputs are untrusted and size
//! capped before parsing.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use serde::Deserialize;
use thiserror::Error;
use tinly_rules_core::CampaignId;
use tinly_rules_core::DegradedEvent;
use tinly_rules_core::DeviceType;
use tinly_rules_core::EngineTelemetry;
use tinly_rules_core::EvaluationScope;
use tinly_rules_core::InMemoryRuleStore;
use tinly_rules_core::LinkId;
use tinly_rules_core::NoopRecorder;
use tinly_rules_core::QrCodeId;
use tinly_rules_core::RedirectRule;
use tinly_rules_core::ResolverConfig;
use tinly_rules_core::RuleGroup;
use tinly_rules_core::RuleResolver;
use tinly_rules_core::SerialBatchId;
use tinly_rules_core::StoreError;
use tinly_rules_core::Timestamp;
use tinly_rules_core::VisitorContext;
use tinly_rules_core::validate_group;
use tinly_rules_core::validate_rule;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum size of rule files accepted by the CLI.
const MAX_RULE_FILE_BYTES: usize = 1024 * 1024;
/// Maximum size of resolver config files accepted by the CLI.
const MAX_CONFIG_BYTES: usize = 64 * 1024;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "tinly-rules", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate every rule and rule group in a rule file.
    Validate(ValidateCommand),
    /// Resolve a simulated visitor request against a rule file.
    Test(TestCommand),
}

/// Configuration for the `validate` command.
#[derive(Args, Debug)]
struct ValidateCommand {
    /// Path to the JSON rule file to validate.
    #[arg(long, value_name = "FILE")]
    rules: PathBuf,
}

/// Configuration for the `test` command.
#[derive(Args, Debug)]
struct TestCommand {
    /// Path to the JSON rule file under test.
    #[arg(long, value_name = "FILE")]
    rules: PathBuf,
    /// Optional TOML config file with resolver settings.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Link identifier the simulated request targets.
    #[arg(long, value_name = "ID")]
    link: Option<u64>,
    /// QR code identifier the simulated request targets.
    #[arg(long, value_name = "ID")]
    qr_code: Option<u64>,
    /// Campaign the target resource belongs to.
    #[arg(long, value_name = "ID")]
    campaign: Option<u64>,
    /// Serial batch the target resource belongs to.
    #[arg(long, value_name = "ID")]
    serial_batch: Option<u64>,
    /// Original destination URL consumed by UTM rewriting actions.
    #[arg(long, value_name = "URL")]
    destination: Option<String>,
    /// Resolution instant as an RFC 3339 timestamp. Defaults to now.
    #[arg(long, value_name = "TIMESTAMP")]
    at: Option<String>,
    /// Visitor country as an ISO 3166-1 alpha-2 code.
    #[arg(long, value_name = "CODE")]
    country: Option<String>,
    /// Visitor city name.
    #[arg(long, value_name = "NAME")]
    city: Option<String>,
    /// Visitor region or state name.
    #[arg(long, value_name = "NAME")]
    region: Option<String>,
    /// Visitor device category.
    #[arg(long, value_enum, value_name = "DEVICE")]
    device: Option<DeviceArg>,
    /// Visitor operating system name.
    #[arg(long, value_name = "NAME")]
    os: Option<String>,
    /// Visitor browser name.
    #[arg(long, value_name = "NAME")]
    browser: Option<String>,
    /// Visitor language as a BCP 47 tag.
    #[arg(long, value_name = "TAG")]
    language: Option<String>,
    /// Referrer URL or host.
    #[arg(long, value_name = "URL")]
    referrer: Option<String>,
    /// Visitor-local calendar date as YYYY-MM-DD.
    #[arg(long, value_name = "DATE")]
    date: Option<String>,
    /// Query parameter as a KEY=VALUE pair. Repeatable.
    #[arg(long, value_name = "KEY=VALUE")]
    query: Vec<String>,
    /// Visitor-local hour of day, 0 through 23.
    #[arg(long, value_name = "HOUR")]
    hour: Option<u8>,
    /// Visitor-local day of week, 0 (Monday) through 6 (Sunday).
    #[arg(long, value_name = "DAY")]
    weekday: Option<u8>,
    /// Scans or clicks recorded for the resource before this request.
    #[arg(long, value_name = "COUNT", default_value_t = 0)]
    scan_count: u64,
    /// Treat the request as the visitor's first scan.
    #[arg(long, action = ArgAction::SetTrue)]
    first_scan: bool,
}

/// Device category argument values.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum DeviceArg {
    /// Phones and other handheld devices.
    Mobile,
    /// Tablets.
    Tablet,
    /// Desktop and laptop browsers.
    Desktop,
}

impl DeviceArg {
    /// Maps the argument onto the engine device category.
    const fn into_device(self) -> DeviceType {
        match self {
            Self::Mobile => DeviceType::Mobile,
            Self::Tablet => DeviceType::Tablet,
            Self::Desktop => DeviceType::Desktop,
        }
    }
}

// ============================================================================
// SECTION: Input Files
// ============================================================================

/// Parsed contents of a JSON rule file.
#[derive(Debug, Deserialize)]
struct RuleFile {
    /// Single rules in the file.
    #[serde(default)]
    rules: Vec<RedirectRule>,
    /// Rule groups in the file.
    #[serde(default)]
    groups: Vec<RuleGroup>,
}

/// Parsed contents of a TOML CLI config file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CliConfig {
    /// Resolver evaluation settings.
    resolver: ResolverConfig,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Validate(command) => command_validate(&command),
        Commands::Test(command) => command_test(&command),
    }
}

// ============================================================================
// SECTION: Validate Command
// ============================================================================

/// Executes the `validate` command.
fn command_validate(command: &ValidateCommand) -> CliResult<ExitCode> {
    let file = load_rule_file(&command.rules)?;
    let mut failures: usize = 0;
    for rule in &file.rules {
        match validate_rule(rule) {
            Ok(()) => emit_line(&format!("ok: rule {} ({})", rule.id, rule.name))?,
            Err(err) => {
                failures = failures.saturating_add(1);
                emit_line(&format!("invalid: rule {} ({}): {err}", rule.id, rule.name))?;
            }
        }
    }
    for group in &file.groups {
        match validate_group(group) {
            Ok(()) => emit_line(&format!("ok: group {} ({})", group.id, group.name))?,
            Err(err) => {
                failures = failures.saturating_add(1);
                emit_line(&format!("invalid: group {} ({}): {err}", group.id, group.name))?;
            }
        }
    }
    if failures == 0 {
        emit_line(&format!(
            "validated {} rules and {} groups",
            file.rules.len(),
            file.groups.len()
        ))?;
        Ok(ExitCode::SUCCESS)
    } else {
        emit_line(&format!("{failures} entries failed validation"))?;
        Ok(ExitCode::FAILURE)
    }
}

// ============================================================================
// SECTION: Test Command
// ============================================================================

/// Executes the `test` command.
fn command_test(command: &TestCommand) -> CliResult<ExitCode> {
    let file = load_rule_file(&command.rules)?;
    let config = match command.config.as_deref() {
        Some(path) => load_config(path)?,
        None => CliConfig::default(),
    };
    let scope = scope_from_args(command)?;
    let context = context_from_args(command)?;
    let now = resolution_instant(command.at.as_deref())?;

    let store = InMemoryRuleStore::new();
    for rule in file.rules {
        store.insert_rule(rule).map_err(staging_error)?;
    }
    for group in file.groups {
        store.insert_group(group).map_err(staging_error)?;
    }

    let resolver = RuleResolver::new(store, NoopRecorder, StderrTelemetry, config.resolver);
    let resolution = resolver.test(&scope, &context, now);
    let rendered = serde_json::to_string_pretty(&resolution)
        .map_err(|err| CliError::new(format!("failed to render resolution: {err}")))?;
    emit_line(&rendered)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Request Assembly
// ============================================================================

/// Builds the evaluation scope from test command arguments.
fn scope_from_args(command: &TestCommand) -> CliResult<EvaluationScope> {
    let mut scope = match (command.link, command.qr_code) {
        (Some(raw), None) => {
            let id = LinkId::from_raw(raw)
                .ok_or_else(|| CliError::new("--link must be a positive identifier".to_string()))?;
            EvaluationScope::link(id)
        }
        (None, Some(raw)) => {
            let id = QrCodeId::from_raw(raw).ok_or_else(|| {
                CliError::new("--qr-code must be a positive identifier".to_string())
            })?;
            EvaluationScope::qr_code(id)
        }
        _ => {
            return Err(CliError::new(
                "exactly one of --link or --qr-code is required".to_string(),
            ));
        }
    };
    if let Some(raw) = command.campaign {
        let id = CampaignId::from_raw(raw)
            .ok_or_else(|| CliError::new("--campaign must be a positive identifier".to_string()))?;
        scope = scope.with_campaign(id);
    }
    if let Some(raw) = command.serial_batch {
        let id = SerialBatchId::from_raw(raw).ok_or_else(|| {
            CliError::new("--serial-batch must be a positive identifier".to_string())
        })?;
        scope = scope.with_serial_batch(id);
    }
    if let Some(destination) = &command.destination {
        scope = scope.with_destination(destination.clone());
    }
    Ok(scope)
}

/// Builds the visitor context from test command arguments.
fn context_from_args(command: &TestCommand) -> CliResult<VisitorContext> {
    if let Some(hour) = command.hour
        && hour > 23
    {
        return Err(CliError::new("--hour must be 0 through 23".to_string()));
    }
    if let Some(day) = command.weekday
        && day > 6
    {
        return Err(CliError::new("--weekday must be 0 through 6".to_string()));
    }
    let mut query_params = BTreeMap::new();
    for pair in &command.query {
        let (key, value) = parse_query_pair(pair)?;
        query_params.insert(key, value);
    }
    Ok(VisitorContext {
        country_code: command.country.clone(),
        city: command.city.clone(),
        region: command.region.clone(),
        device_type: command.device.map(DeviceArg::into_device),
        os: command.os.clone(),
        browser: command.browser.clone(),
        language: command.language.clone(),
        referrer: command.referrer.clone(),
        query_params,
        local_hour: command.hour,
        day_of_week: command.weekday,
        date: command.date.clone(),
        scan_count: command.scan_count,
        is_first_scan: command.first_scan || command.scan_count == 0,
    })
}

/// Splits one `--query` argument into a key and value.
fn parse_query_pair(pair: &str) -> CliResult<(String, String)> {
    let Some((key, value)) = pair.split_once('=') else {
        return Err(CliError::new(format!(
            "invalid --query pair '{pair}': expected KEY=VALUE"
        )));
    };
    let key = key.trim();
    if key.is_empty() {
        return Err(CliError::new(format!(
            "invalid --query pair '{pair}': key is empty"
        )));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Returns the resolution instant, preferring an explicit `--at` timestamp.
fn resolution_instant(at: Option<&str>) -> CliResult<Timestamp> {
    match at {
        Some(raw) => Timestamp::from_rfc3339(raw)
            .map_err(|err| CliError::new(format!("invalid --at timestamp: {err}"))),
        None => {
            let elapsed = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_err(|err| CliError::new(format!("system clock before the epoch: {err}")))?;
            let millis = i64::try_from(elapsed.as_millis())
                .map_err(|err| CliError::new(format!("system clock out of range: {err}")))?;
            Ok(Timestamp::from_unix_millis(millis))
        }
    }
}

// ============================================================================
// SECTION: File Loading
// ============================================================================

/// Reads a file into memory, enforcing a size limit.
fn read_bounded(path: &Path, max_bytes: usize) -> CliResult<Vec<u8>> {
    let bytes = fs::read(path)
        .map_err(|err| CliError::new(format!("failed to read {}: {err}", path.display())))?;
    if bytes.len() > max_bytes {
        return Err(CliError::new(format!(
            "{} exceeds the {max_bytes} byte limit",
            path.display()
        )));
    }
    Ok(bytes)
}

/// Loads and parses a JSON rule file.
fn load_rule_file(path: &Path) -> CliResult<RuleFile> {
    let bytes = read_bounded(path, MAX_RULE_FILE_BYTES)?;
    serde_json::from_slice(&bytes)
        .map_err(|err| CliError::new(format!("failed to parse {}: {err}", path.display())))
}

/// Loads and parses a TOML CLI config file.
fn load_config(path: &Path) -> CliResult<CliConfig> {
    let bytes = read_bounded(path, MAX_CONFIG_BYTES)?;
    let text = std::str::from_utf8(&bytes)
        .map_err(|err| CliError::new(format!("{} is not valid UTF-8: {err}", path.display())))?;
    toml::from_str(text)
        .map_err(|err| CliError::new(format!("failed to parse {}: {err}", path.display())))
}

/// Maps a store failure while staging rule file contents.
fn staging_error(err: StoreError) -> CliError {
    CliError::new(format!("failed to stage rules: {err}"))
}

// ============================================================================
// SECTION: Telemetry
// ============================================================================

/// Telemetry sink that reports degraded evaluation events on stderr.
#[derive(Debug, Clone, Copy, Default)]
struct StderrTelemetry;

impl EngineTelemetry for StderrTelemetry {
    fn on_degraded(&self, event: DegradedEvent) {
        let source = event
            .source
            .map_or_else(|| "resolver".to_string(), |source| source.to_string());
        let _ = write_stderr_line(&format!(
            "warning: {source} degraded ({}): {}",
            event.reason.as_str(),
            event.detail
        ));
    }
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout, mapping failures to CLI errors.
fn emit_line(message: &str) -> CliResult<()> {
    write_stdout_line(message).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output stream failure message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
