//! Purpose: `tfinv` CLI entry point implementing the dynamic-inventory protocol.
//! Role: Binary crate root; parses args, extracts state views, emits JSON/INI on stdout.
//! Invariants: stdout carries only the requested payload; diagnostics go to stderr.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
use std::fs;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{CommandFactory, Parser, ValueHint, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

mod inventory;

use inventory::Inventory;
use tfinv::api::{self, Error, ErrorKind, State, WalkStats, to_exit_code};
use tfinv::notice::{Notice, notice_json};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, Error> {
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Try `tfinv --help`."));
            }
        },
    };

    if let Some(shell) = cli.completion {
        let mut cmd = Cli::command();
        clap_complete::aot::generate(shell, &mut cmd, "tfinv", &mut io::stdout());
        return Ok(RunOutcome::ok());
    }

    let mode = select_mode(&cli)?;
    let source = resolve_state_source(cli.state_file);
    let state = read_state(&source).map_err(add_corrupt_hint)?;

    let (outputs, output_stats) = api::outputs(&state);
    let (resources, resource_stats) = api::resources(&state);
    let id_names = api::resource_id_names(&state);

    if output_stats.skipped + resource_stats.skipped > 0 {
        emit_notice(&skip_notice(&mode, &source, output_stats, resource_stats));
    }

    let inventory = Inventory::build(&resources, &outputs, &id_names);
    match mode {
        Mode::List => emit_json(inventory.list_json()),
        Mode::Host(host) => emit_json(inventory.host_json(&host)),
        Mode::Inventory => print!("{}", inventory.render_ini()),
    }

    Ok(RunOutcome::ok())
}

#[derive(Debug, Parser)]
#[command(
    name = "tfinv",
    version,
    about = "Ansible dynamic inventory from Terraform state",
    after_help = r#"EXAMPLES
  $ tfinv --list deploy/terraform.tfstate
  $ tfinv --host 203.0.113.10
  $ tfinv --inventory - < terraform.tfstate
  $ TF_STATE=deploy/terraform.tfstate ansible-playbook -i $(which tfinv) site.yml

The state file defaults to $TF_STATE, then ./terraform.tfstate. Use `-` to
read from stdin."#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(long, help = "Emit the full inventory as dynamic-inventory JSON")]
    list: bool,
    #[arg(long, value_name = "HOST", help = "Emit hostvars JSON for one host")]
    host: Option<String>,
    #[arg(long, help = "Emit a static INI inventory")]
    inventory: bool,
    #[arg(
        long,
        value_name = "SHELL",
        help = "Generate shell completions and exit"
    )]
    completion: Option<Shell>,
    #[arg(
        value_name = "STATE_FILE",
        help = "Path to the state file (default: $TF_STATE, then ./terraform.tfstate; - for stdin)",
        value_hint = ValueHint::FilePath
    )]
    state_file: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Mode {
    List,
    Host(String),
    Inventory,
}

impl Mode {
    fn label(&self) -> &'static str {
        match self {
            Mode::List => "list",
            Mode::Host(_) => "host",
            Mode::Inventory => "inventory",
        }
    }
}

fn select_mode(cli: &Cli) -> Result<Mode, Error> {
    match (cli.list, &cli.host, cli.inventory) {
        (true, None, false) => Ok(Mode::List),
        (false, Some(host), false) => Ok(Mode::Host(host.clone())),
        (false, None, true) => Ok(Mode::Inventory),
        (false, None, false) => Err(Error::new(ErrorKind::Usage)
            .with_message("one of --list, --host, or --inventory is required")
            .with_hint("Use `tfinv --list <statefile>` for the full inventory.")),
        _ => Err(Error::new(ErrorKind::Usage)
            .with_message("--list, --host, and --inventory are mutually exclusive")
            .with_hint("Pick exactly one output mode.")),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum StateSource {
    Stdin,
    File(PathBuf),
}

impl StateSource {
    fn label(&self) -> String {
        match self {
            StateSource::Stdin => "-".to_string(),
            StateSource::File(path) => path.display().to_string(),
        }
    }
}

fn resolve_state_source(arg: Option<PathBuf>) -> StateSource {
    let path = arg
        .or_else(|| {
            std::env::var_os("TF_STATE")
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| PathBuf::from("terraform.tfstate"));

    if path.as_os_str() == "-" {
        StateSource::Stdin
    } else {
        StateSource::File(path)
    }
}

fn read_state(source: &StateSource) -> Result<State, Error> {
    match source {
        StateSource::Stdin => State::read(io::stdin().lock()),
        StateSource::File(path) => {
            let file = fs::File::open(path).map_err(|err| match err.kind() {
                io::ErrorKind::NotFound => Error::new(ErrorKind::NotFound)
                    .with_message("state file not found")
                    .with_path(path)
                    .with_hint("Run terraform first, set TF_STATE, or pass the state file path."),
                _ => Error::new(ErrorKind::Io)
                    .with_message("cannot open state file")
                    .with_path(path)
                    .with_source(err),
            })?;
            State::read(file).map_err(|err| err.with_path(path))
        }
    }
}

fn add_corrupt_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Corrupt || err.hint().is_some() {
        return err;
    }
    err.with_hint(
        "The file does not decode as a terraform state document. Check the path and that the state was written by a supported terraform version.",
    )
}

fn skip_notice(
    mode: &Mode,
    source: &StateSource,
    outputs: WalkStats,
    resources: WalkStats,
) -> Notice {
    let skipped = outputs.skipped + resources.skipped;
    let mut details = Map::new();
    details.insert("skipped_outputs".to_string(), json!(outputs.skipped));
    details.insert("skipped_resources".to_string(), json!(resources.skipped));
    details.insert(
        "visited".to_string(),
        json!(outputs.visited + resources.visited),
    );

    Notice {
        kind: "skip".to_string(),
        time: notice_time_now().unwrap_or_default(),
        cmd: mode.label().to_string(),
        source: source.label(),
        message: format!("skipped {skipped} unparseable state entries"),
        details,
    }
}

fn notice_time_now() -> Option<String> {
    use time::format_description::well_known::Rfc3339;
    let duration = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
    let ts = time::OffsetDateTime::from_unix_timestamp_nanos(duration.as_nanos() as i128).ok()?;
    ts.format(&Rfc3339).ok()
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // Logs share stderr with notices; stdout stays payload-only.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn emit_json(value: Value) {
    let json = if io::stdout().is_terminal() {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

fn emit_error(err: &Error) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, true));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn emit_notice(notice: &Notice) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        let label = colorize_label("notice:", true, AnsiColor::Yellow);
        eprintln!("{label} {} (source: {})", notice.message, notice.source);
        return;
    }

    let value = notice_json(notice);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"notice\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::Corrupt => "corrupt state document".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    use std::error::Error as StdError;
    let mut causes = Vec::new();
    let mut cur = StdError::source(err);
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    ));

    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(path) = err.path() {
        lines.push(format!(
            "{} {}",
            colorize_label("path:", use_color, AnsiColor::Yellow),
            path.display()
        ));
    }

    let causes = error_causes(err);
    if let Some(cause) = causes.first() {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, AnsiColor::Yellow)
        ));
    }

    lines.join("\n")
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}
