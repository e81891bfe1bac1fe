//! Lumina TUI - a terminal client for the Lumina image gallery.
//!
//! This application provides a fast, keyboard-driven interface for
//! browsing, searching, uploading, and editing images in a Lumina
//! gallery, including the AI-derived metadata attached to each image.

mod api;
mod app;
mod auth;
mod config;
mod models;
#[cfg(test)]
mod testing;
mod ui;
mod utils;

use std::io::{self, Write};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    // Check for CLI commands
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "--login" {
        return login_cli().await;
    }

    // Initialize logging
    init_tracing();
    info!("Lumina TUI starting");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app
    let mut app = App::new()?;

    // Guard the gallery: unauthenticated sessions see the login overlay
    if app.is_authenticated() {
        app.reload_current_screen();
    } else {
        app.start_login();
    }

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("Lumina TUI shutting down");
    Ok(())
}

/// Prompt-based login for scripted use: authenticates, persists the
/// session, and exits without entering the TUI.
async fn login_cli() -> Result<()> {
    let mut config = config::Config::load()?;
    let store = auth::CredentialStore::new(config.credential_dir()?)?;
    let api = api::ApiClient::new(config.base_url(), store.clone())?;
    let mut session = auth::SessionController::bootstrap(store);

    println!("\n=== Lumina Login ===\n");

    let email = match config.last_email {
        Some(ref last_email) => {
            print!("Email [{}]: ", last_email);
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            let input = input.trim();

            if input.is_empty() {
                last_email.clone()
            } else {
                input.to_string()
            }
        }
        None => {
            print!("Email: ");
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            input.trim().to_string()
        }
    };

    let password = rpassword::prompt_password("Password: ")?;

    println!("\nAuthenticating...");
    let message = session
        .login(&api, &models::Credentials::new(email.clone(), password))
        .await?;

    config.last_email = Some(email);
    config.save()?;

    println!("{}\n", message);
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                // Handle input
                if handle_input(app, key).await? {
                    return Ok(());
                }
            }
        }

        // Drain session-expiry signals and completed background fetches
        app.check_background_tasks();

        // Fire the debounced search once the quiet window elapses
        app.tick();

        // Check if we should quit
        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
