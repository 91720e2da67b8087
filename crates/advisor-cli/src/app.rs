use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use advisor_core::export::{CredentialProvider, GoogleAuth, GoogleDocsExporter};
use advisor_core::{
    FileStore, GroundingSearch, KeyValueStore, MemoryStore, Orchestrator, SaveOutcome, Settings,
};

use crate::commands::{handle_command, CommandResult};
use crate::render;

/// Where persisted state lives for this run.
pub enum StoreLocation {
    Default,
    Dir(PathBuf),
    Ephemeral,
}

pub fn open_store(location: StoreLocation) -> Result<Arc<dyn KeyValueStore>> {
    let store: Arc<dyn KeyValueStore> = match location {
        StoreLocation::Ephemeral => Arc::new(MemoryStore::new()),
        StoreLocation::Dir(dir) => Arc::new(FileStore::with_dir(dir)?),
        StoreLocation::Default => Arc::new(FileStore::new()?),
    };
    Ok(store)
}

struct App {
    orchestrator: Orchestrator,
    auth: Option<Arc<GoogleAuth>>,
    advisor_name: String,
    greeting: String,
    provider: String,
    model: String,
    search_enabled: bool,
}

impl App {
    fn new(settings: &Settings, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let history = Arc::new(settings.build_history(store.clone()));
        let restored = history.hydrate();
        tracing::debug!(restored, "History loaded");

        let search = settings.build_search().unwrap_or_else(|e| {
            tracing::warn!("Web grounding disabled: {e}");
            GroundingSearch::disabled()
        });
        let search_enabled = search.is_enabled();

        let generator = settings
            .build_generator()
            .context("Failed to set up the language model")?;
        let model = generator.model().to_string();

        let mut orchestrator = Orchestrator::new(history, search, generator);

        let auth = settings.build_google_auth(store.clone()).map(Arc::new);
        if let Some(auth) = &auth {
            let exporter = GoogleDocsExporter::new(auth.clone(), store)
                .with_title(&settings.google.document_title);
            orchestrator = orchestrator.with_documents(Arc::new(exporter), auth.clone());
        }

        Ok(Self {
            orchestrator,
            auth,
            advisor_name: settings.persona.name.clone(),
            greeting: settings.persona.greeting.clone(),
            provider: settings.llm.provider.name().to_string(),
            model,
            search_enabled,
        })
    }

    async fn send(&self, text: &str) {
        match self.orchestrator.send_message(text).await {
            Ok(turn) => println!("\n{}\n", render::format_turn(&turn, &self.advisor_name)),
            Err(e) => eprintln!("Error: {e}"),
        }
    }

    async fn save(&self, turn_id: u64) {
        let outcome = self.orchestrator.save_to_document(turn_id).await;
        println!("{}", render::format_notice(&outcome.notice()));
        if matches!(outcome, SaveOutcome::AuthRequired | SaveOutcome::SessionExpired) {
            self.print_auth_hint();
        }
    }

    fn print_auth_hint(&self) {
        if let Some(auth) = &self.auth {
            println!("Open this URL to sign in, then run /auth <code>:\n{}", auth.authorization_url());
        }
    }

    fn status(&self) -> String {
        let signed_in = match &self.auth {
            Some(auth) if auth.is_authenticated() => "signed in",
            Some(_) => "signed out",
            None => "not configured",
        };
        format!(
            "Provider: {}\nModel: {}\nWeb grounding: {}\nGoogle Docs: {}\nMessages: {}",
            self.provider,
            self.model,
            if self.search_enabled { "on" } else { "off" },
            signed_in,
            self.orchestrator.history().len(),
        )
    }

    /// Returns `false` when the loop should stop.
    async fn handle_line(&self, line: &str) -> bool {
        match handle_command(line) {
            CommandResult::NotACommand => self.send(line).await,
            CommandResult::Message(msg) => println!("{msg}"),
            CommandResult::Quit => return false,
            CommandResult::Clear => {
                self.orchestrator.clear_history();
                println!("Chat history cleared.");
            }
            CommandResult::ShowHistory => {
                let state = self.orchestrator.state();
                println!("{}", render::format_history(&state.turns, &self.advisor_name));
            }
            CommandResult::ShowStatus => println!("{}", self.status()),
            CommandResult::SaveTurn(id) => self.save(id).await,
            CommandResult::SaveLatest => {
                let state = self.orchestrator.state();
                match render::latest_advisor_turn(&state) {
                    Some(turn) => self.save(turn.id).await,
                    None => println!("Nothing to save yet."),
                }
            }
            CommandResult::StartAuth => match &self.auth {
                Some(auth) => {
                    auth.initiate_auth();
                    self.print_auth_hint();
                }
                None => println!("Google sign-in is not configured."),
            },
            CommandResult::CompleteAuth(code) => match &self.auth {
                Some(auth) => match auth.handle_callback(&code).await {
                    Ok(_) => println!("Signed in to Google."),
                    Err(e) => eprintln!("Error: {e}"),
                },
                None => println!("Google sign-in is not configured."),
            },
            CommandResult::Logout => match &self.auth {
                Some(auth) => match auth.logout() {
                    Ok(()) => println!("Signed out of Google."),
                    Err(e) => eprintln!("Error: {e}"),
                },
                None => println!("Google sign-in is not configured."),
            },
        }
        true
    }
}

/// Answer one prompt and exit.
pub async fn run_single_prompt(
    settings: &Settings,
    store: Arc<dyn KeyValueStore>,
    prompt: &str,
) -> Result<()> {
    let app = App::new(settings, store)?;
    let turn = app.orchestrator.send_message(prompt).await?;
    println!("{}", turn.text);
    Ok(())
}

// ── Interactive loop ────────────────────────────────────────────────────

pub async fn run_repl(settings: &Settings, store: Arc<dyn KeyValueStore>) -> Result<()> {
    let app = App::new(settings, store)?;

    println!("{}: {}", app.advisor_name, app.greeting);
    let restored = app.orchestrator.history().len();
    if restored > 0 {
        println!("({restored} earlier messages restored; /history to show them)");
    }
    println!("Type /help for commands.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };

        if line.trim().is_empty() {
            continue;
        }
        if !app.handle_line(&line).await {
            break;
        }
    }

    Ok(())
}
