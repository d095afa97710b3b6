use anyhow::Result;
use argh::FromArgs;
use menu_commands::{AppSettings, LineEditor, Session, ShellRunner, loader};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// Interactive launcher for menu-driven command extensions.
struct Args {
    #[argh(option)]
    /// directory holding the extension definitions (*.yml); defaults to `extensions/` next to the executable.
    extensions_dir: Option<PathBuf>,

    #[argh(option)]
    /// application settings file; defaults to `appsettings.yml` next to the executable.
    settings: Option<PathBuf>,

    #[argh(option, default = "String::from(\"MENU\")")]
    /// heading shown above the extension list.
    title: String,

    #[argh(switch, short = 'v')]
    /// log debug details to stderr.
    verbose: bool,
}

fn main() -> ExitCode {
    let args: Args = argh::from_env();
    init_tracing(args.verbose);

    match run(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    let base_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));
    let extensions_dir = args
        .extensions_dir
        .unwrap_or_else(|| base_dir.join("extensions"));
    let settings_path = args
        .settings
        .unwrap_or_else(|| base_dir.join("appsettings.yml"));

    let settings = AppSettings::load(&settings_path)?;
    let report = loader::load_dir(&extensions_dir)?;
    for diagnostic in &report.diagnostics {
        eprintln!("{diagnostic}");
    }
    if report.registry.is_empty() {
        println!("No valid extensions found.");
        return Ok(ExitCode::FAILURE);
    }
    tracing::debug!(count = report.registry.len(), "extensions loaded");

    let mut console = LineEditor::new()?;
    let mut runner = ShellRunner::default();
    let outcome = Session::new(&report.registry, &settings, &mut console, &mut runner)
        .with_title(args.title)
        .run()?;
    tracing::debug!(?outcome, "session finished");
    Ok(ExitCode::SUCCESS)
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
