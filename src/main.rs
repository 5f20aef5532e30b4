use std::{
    io::{self, BufRead, Write},
    process::ExitCode,
    rc::Rc,
    time::Duration,
};

use clap::{Args, Parser, Subcommand};
use tunnel_console::{
    ConsoleConfig, Outcome, Preferences, ReqwestClient, Session, TunnelInput,
    config::configuration_path, i18n::system_languages, message::Params, overlay::TestPhase,
};

#[derive(Parser)]
#[command(name = "tunnel-console")]
#[command(about = "Manage tunnel definitions on a tunnel server", version)]
struct Cli {
    /// Base URL of the tunnel server, overrides the config file.
    #[arg(long, global = true, env = "TUNNEL_CONSOLE_SERVER")]
    server: Option<String>,
    /// Interface language code, remembered for later runs.
    #[arg(long, global = true)]
    lang: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show all tunnels.
    List,
    /// Create a tunnel.
    Create(CreateArgs),
    /// Change an existing tunnel.
    Edit(EditArgs),
    /// Enable a disabled tunnel or disable an enabled one.
    Toggle { id: String },
    /// Remove a tunnel.
    Delete {
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Check whether the server can reach a host and port.
    Test { host: String, port: u16 },
    /// Show the preset tunnel suggestions.
    Suggestions,
    /// Show the available interface languages.
    Languages,
}

#[derive(Args)]
struct CreateArgs {
    /// Start from the suggestion with this index.
    #[arg(long)]
    suggestion: Option<usize>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    local_port: Option<String>,
    #[arg(long)]
    target_host: Option<String>,
    #[arg(long)]
    target_port: Option<String>,
    #[arg(long)]
    disabled: bool,
}

#[derive(Args)]
struct EditArgs {
    id: String,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    local_port: Option<String>,
    #[arg(long)]
    target_host: Option<String>,
    #[arg(long)]
    target_port: Option<String>,
    #[arg(long)]
    enabled: Option<bool>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("tunnel_console=warn"),
    )
    .init();

    let cli = Cli::parse();
    log::info!(
        "tunnel-console v{} starting (RUST_LOG={})",
        env!("CARGO_PKG_VERSION"),
        std::env::var("RUST_LOG").unwrap_or_else(|_| "<default: warn>".into()),
    );

    let mut config = ConsoleConfig::load(&configuration_path());
    if let Some(server) = cli.server {
        config.server_url = server;
    }
    log::info!("[startup] server: {}", config.api_base());

    let client = match ReqwestClient::new(Duration::from_secs(config.request_timeout_secs)) {
        Ok(client) => client,
        Err(error) => {
            eprintln!("{error}");
            return ExitCode::FAILURE;
        }
    };

    let preferences_path = Preferences::file_path();
    let preferences = Preferences::load(&preferences_path);
    let session =
        Session::new(config, Rc::new(client)).with_preferences(preferences, Some(preferences_path));
    session.init(&system_languages()).await;
    if let Some(code) = &cli.lang {
        session.set_language(code).await;
    }

    let outcome = run(&session, cli.command).await;
    print_toasts(&session);

    match outcome {
        Outcome::Applied => ExitCode::SUCCESS,
        other => {
            log::debug!("[cli] finished with {other:?}");
            ExitCode::FAILURE
        }
    }
}

async fn run(session: &Session, command: Command) -> Outcome {
    match command {
        Command::List => {
            print_tunnels(session);
            Outcome::Applied
        }
        Command::Create(arguments) => {
            let base = match arguments.suggestion {
                Some(index) => match session.apply_suggestion(index) {
                    Some(input) => input,
                    None => {
                        eprintln!("no suggestion with index {index}");
                        return Outcome::NotFound;
                    }
                },
                None => TunnelInput {
                    enabled: true,
                    ..TunnelInput::default()
                },
            };
            let input = merge(
                base,
                arguments.name,
                arguments.local_port,
                arguments.target_host,
                arguments.target_port,
                Some(!arguments.disabled),
            );
            session.create(&input).await
        }
        Command::Edit(arguments) => {
            if !session.open_edit(&arguments.id) {
                eprintln!("no tunnel with id {}", arguments.id);
                return Outcome::NotFound;
            }
            let current = session
                .overlays()
                .edit_form()
                .map(|form| form.input.clone())
                .unwrap_or_default();
            session.set_edit_input(merge(
                current,
                arguments.name,
                arguments.local_port,
                arguments.target_host,
                arguments.target_port,
                arguments.enabled,
            ));
            session.submit_edit().await
        }
        Command::Toggle { id } => session.toggle(&id).await,
        Command::Delete { id, yes } => session.delete(&id, |question| yes || confirm(question)).await,
        Command::Test { host, port } => {
            let outcome = session.test_connection(&host, port).await;
            print_test_modal(session);
            outcome
        }
        Command::Suggestions => {
            for (index, suggestion) in session.suggestions().iter().enumerate() {
                println!(
                    "{index:>3}  {:<20} {}:{}  {}",
                    suggestion.name, suggestion.target_host, suggestion.target_port, suggestion.description
                );
            }
            Outcome::Applied
        }
        Command::Languages => {
            let current = session.current_language().map(|language| language.code);
            for language in session.languages() {
                let marker = if current.as_deref() == Some(language.code.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!("{marker} {:<6} {} {}", language.code, language.flag, language.name);
            }
            Outcome::Applied
        }
    }
}

/// Command line values override the form; port text goes through the same
/// parsing as typed input.
fn merge(
    base: TunnelInput,
    name: Option<String>,
    local_port: Option<String>,
    target_host: Option<String>,
    target_port: Option<String>,
    enabled: Option<bool>,
) -> TunnelInput {
    let text = |value: Option<i64>| value.map(|port| port.to_string()).unwrap_or_default();
    TunnelInput::from_text(
        name.as_deref().unwrap_or(&base.name),
        local_port.as_deref().unwrap_or(&text(base.local_port)),
        target_host.as_deref().unwrap_or(&base.target_host),
        target_port.as_deref().unwrap_or(&text(base.target_port)),
        enabled.unwrap_or(base.enabled),
    )
}

fn confirm(question: &str) -> bool {
    print!("{question} [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
        Err(error) => {
            log::warn!("[cli] could not read confirmation: {error}");
            false
        }
    }
}

fn print_tunnels(session: &Session) {
    let stats = session.stats();
    println!(
        "{} {}  {} {}  {} {}",
        session.t("stats.total", &Params::new()),
        stats.total,
        session.t("stats.active", &Params::new()),
        stats.active,
        session.t("stats.inactive", &Params::new()),
        stats.inactive
    );

    for tunnel in session.tunnels() {
        let state = if tunnel.enabled { "on " } else { "off" };
        println!(
            "{}  {state}  {:<20} :{} -> {}:{}  {}",
            tunnel.id,
            tunnel.name,
            tunnel.local_port,
            tunnel.target_host,
            tunnel.target_port,
            session.connection_url(&tunnel).unwrap_or_default()
        );
        if let Some(warning) = session.warning_text(&tunnel) {
            println!("      ⚠ {warning}");
        }
    }
}

fn print_test_modal(session: &Session) {
    let overlays = session.overlays();
    let Some(modal) = overlays.test_modal() else {
        return;
    };
    println!("{}", modal.title(session.localizer()));
    if let Some(status) = modal.phase.status_id() {
        println!("{}", session.localizer().text(status));
    }
    match &modal.phase {
        TestPhase::Loading => {}
        TestPhase::Succeeded { log } | TestPhase::Failed { output: log } => {
            if !log.is_empty() {
                println!("{log}");
            }
        }
    }
}

fn print_toasts(session: &Session) {
    for toast in session.toasts() {
        eprintln!("{} {}", toast.severity.icon(), toast.message);
    }
}
