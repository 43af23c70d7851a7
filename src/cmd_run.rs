//! Interactive session against a running Chrome.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};

use capturekit_api::TaskApiClient;
use capturekit_config::Config;
use capturekit_coordinator::{Command, Coordinator, Intent, Reply};
use capturekit_debugger::{CdpBrowser, DebuggerController};
use capturekit_protocols::{BrowserSignal, DebuggerDriver, Notification, TabHost, TabId, ViewState};

use crate::adapters::{notification_bus, open_state};

const HELP: &str = "\
commands:
  select                          pick an element on the active tab
  cancel | dismiss                drop the current selection
  logs on|off                     capture console output
  network on|off                  capture network activity
  css on|off                      include computed styles in the prompt
  tabs                            list known tabs
  tab <id>                        switch to a tab
  draft <text>                    save the task draft
  view select|task|result|history remember the panel view
  panel                           show what the panel would render
  submit <source-id> [branch] -- <task>
  sources | history               refresh remote listings
  status                          show session state
  quit";

/// One parsed stdin line.
#[derive(Debug, PartialEq)]
pub(crate) enum Input {
    Intent(Intent),
    Tab(TabId),
    Tabs,
    Help,
    Quit,
}

/// Parse a command line. `Ok(None)` for blank input.
pub(crate) fn parse_line(line: &str) -> Result<Option<Input>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map(|(w, r)| (w, r.trim()))
        .unwrap_or((line, ""));

    let input = match word {
        "select" => Input::Intent(Intent::StartSelection),
        "cancel" | "dismiss" => Input::Intent(Intent::CancelSelection),
        "logs" => Input::Intent(Intent::ToggleLogCapture(parse_switch(rest)?)),
        "network" => Input::Intent(Intent::ToggleNetworkCapture(parse_switch(rest)?)),
        "css" => Input::Intent(Intent::ToggleCssCapture(parse_switch(rest)?)),
        "tabs" => Input::Tabs,
        "tab" => Input::Tab(
            rest.parse()
                .map_err(|_| format!("not a tab id: {:?}", rest))?,
        ),
        "draft" => Input::Intent(Intent::SaveDraft(rest.to_string())),
        "view" => Input::Intent(Intent::SetView(parse_view(rest)?)),
        "panel" => Input::Intent(Intent::GetPanelData),
        "submit" => Input::Intent(parse_submit(rest)?),
        "sources" => Input::Intent(Intent::FetchSources),
        "history" => Input::Intent(Intent::FetchHistory),
        "status" => Input::Intent(Intent::Status),
        "help" | "?" => Input::Help,
        "quit" | "exit" => Input::Quit,
        other => return Err(format!("unknown command: {} (try `help`)", other)),
    };
    Ok(Some(input))
}

fn parse_switch(arg: &str) -> Result<bool, String> {
    match arg {
        "on" => Ok(true),
        "off" => Ok(false),
        _ => Err(format!("expected on|off, got {:?}", arg)),
    }
}

fn parse_view(arg: &str) -> Result<ViewState, String> {
    serde_json::from_value(serde_json::Value::String(arg.to_string()))
        .map_err(|_| format!("unknown view: {:?}", arg))
}

fn parse_submit(rest: &str) -> Result<Intent, String> {
    const USAGE: &str = "usage: submit <source-id> [branch] -- <task>";
    // Ids and branches may contain `--`; only a standalone one separates the task.
    let (head, task) = rest.split_once(" -- ").ok_or(USAGE)?;
    let task = task.trim();
    let mut head = head.split_whitespace();
    let repository_id = head.next().ok_or(USAGE)?;
    let branch = head.next().map(str::to_string);
    if task.is_empty() || head.next().is_some() {
        return Err(USAGE.to_string());
    }
    Ok(Intent::SubmitTask {
        task: task.to_string(),
        repository_id: repository_id.to_string(),
        branch,
    })
}

/// Connect to Chrome and serve stdin commands until `quit` or EOF.
pub(crate) async fn run_session(
    config: Config,
    endpoint: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let endpoint = endpoint.unwrap_or_else(|| config.debugger.endpoint.clone());
    info!("Starting capturekit v{}", env!("CARGO_PKG_VERSION"));

    let (browser, events) = CdpBrowser::connect(&endpoint).await?;
    let host: Arc<dyn TabHost> = browser.clone();
    let driver: Arc<dyn DebuggerDriver> = browser.clone();

    let state = open_state(&config, host.clone()).await?;
    let bus = notification_bus(&config);
    let debugger = Arc::new(DebuggerController::new(
        state.clone(),
        driver,
        host.clone(),
        bus.clone(),
        config.debugger.clone(),
    ));
    debugger.resume().await;
    let api = Arc::new(TaskApiClient::new(&config.api)?);
    let coordinator = Arc::new(Coordinator::new(
        state,
        debugger,
        host,
        api,
        bus.clone(),
    ));

    let (signal_tx, signal_rx) = mpsc::channel(256);
    let (command_tx, command_rx) = mpsc::channel(32);
    tokio::spawn(browser.clone().pump_events(events, signal_tx.clone()));
    let runner = tokio::spawn(coordinator.run(command_rx, signal_rx));
    let printer = tokio::spawn(print_notifications(bus.subscribe()));

    for tab in browser.tabs() {
        println!("tab {}: {}", tab.id, tab.url.as_deref().unwrap_or(""));
    }
    if let Some(Reply::Draft(draft)) = request(&command_tx, Intent::PanelOpened).await {
        if !draft.is_empty() {
            println!("draft: {}", draft);
        }
    }
    println!("type `help` for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = match parse_line(&line) {
            Ok(Some(input)) => input,
            Ok(None) => continue,
            Err(message) => {
                eprintln!("{}", message);
                continue;
            }
        };

        match input {
            Input::Quit => break,
            Input::Help => println!("{}", HELP),
            Input::Tabs => {
                for tab in browser.tabs() {
                    println!("tab {}: {}", tab.id, tab.url.as_deref().unwrap_or(""));
                }
            }
            Input::Tab(tab) => match browser.activate(tab).await {
                Ok(info) => {
                    println!("active: {}", info.url.as_deref().unwrap_or(""));
                    if signal_tx
                        .send(BrowserSignal::TabActivated { tab })
                        .await
                        .is_err()
                    {
                        warn!("Coordinator is gone");
                        break;
                    }
                }
                Err(e) => eprintln!("{}", e),
            },
            Input::Intent(intent) => match request(&command_tx, intent).await {
                Some(reply) => print_reply(&reply),
                None => break,
            },
        }
    }

    drop(command_tx);
    drop(signal_tx);
    runner.await?;
    printer.abort();
    info!("Session closed");
    Ok(())
}

async fn request(commands: &mpsc::Sender<Command>, intent: Intent) -> Option<Reply> {
    let (command, reply) = Command::request(intent);
    commands.send(command).await.ok()?;
    reply.await.ok()
}

fn print_reply(reply: &Reply) {
    match reply {
        Reply::Ack => {}
        Reply::Draft(draft) => println!("draft: {}", draft),
        Reply::PanelData(data) => match serde_json::to_string_pretty(data) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("{}", e),
        },
        Reply::Status(status) => {
            println!("debugger:  {:?} (tab {:?})", status.phase, status.debugging_tab);
            println!("capture:   tab {:?}, view {}", status.captured_tab, status.view);
            println!(
                "flags:     logs={} network={} css={}",
                status.flags.logs, status.flags.network, status.flags.css
            );
            println!(
                "records:   {} console, {} network",
                status.log_records, status.network_records
            );
            println!("api key:   {}", if status.has_api_key { "set" } else { "missing" });
        }
    }
}

/// Print notifications until the bus closes.
pub(crate) async fn print_notifications(mut rx: broadcast::Receiver<Notification>) {
    loop {
        match rx.recv().await {
            Ok(notification) => print_notification(&notification),
            Err(broadcast::error::RecvError::Lagged(n)) => warn!("Skipped {} notifications", n),
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

pub(crate) fn print_notification(notification: &Notification) {
    match notification {
        Notification::Error(message) => eprintln!("error: {}", message),
        Notification::SourcesLoaded(sources) | Notification::SourcesRefreshed(sources) => {
            for source in sources {
                println!("{}  {}", source.id, source.name);
            }
        }
        Notification::HistoryLoaded {
            sessions,
            from_cache,
        } => {
            if *from_cache {
                println!("(cached)");
            }
            for session in sessions {
                println!(
                    "{}  {}  [{}]",
                    session.id,
                    session.title,
                    session.state.as_deref().unwrap_or("?")
                );
            }
        }
        Notification::TaskCreated { session, url } => {
            println!("task created: {} {}", session.id, url)
        }
        Notification::ElementCaptured { selector } => println!("captured: {}", selector),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toggles() {
        assert_eq!(
            parse_line("logs on").unwrap(),
            Some(Input::Intent(Intent::ToggleLogCapture(true)))
        );
        assert_eq!(
            parse_line("  network   off ").unwrap(),
            Some(Input::Intent(Intent::ToggleNetworkCapture(false)))
        );
        assert!(parse_line("css maybe").is_err());
    }

    #[test]
    fn test_dismiss_is_cancel() {
        assert_eq!(
            parse_line("dismiss").unwrap(),
            parse_line("cancel").unwrap()
        );
    }

    #[test]
    fn test_parse_submit() {
        assert_eq!(
            parse_line("submit sources/github/acme/web dev -- Fix -- the header").unwrap(),
            Some(Input::Intent(Intent::SubmitTask {
                task: "Fix -- the header".into(),
                repository_id: "sources/github/acme/web".into(),
                branch: Some("dev".into()),
            }))
        );
        assert_eq!(
            parse_line("submit sources/github/acme/web -- Fix it").unwrap(),
            Some(Input::Intent(Intent::SubmitTask {
                task: "Fix it".into(),
                repository_id: "sources/github/acme/web".into(),
                branch: None,
            }))
        );
        assert!(parse_line("submit sources/github/acme/web").is_err());
        assert!(parse_line("submit -- task").is_err());
        assert!(parse_line("submit a b c -- task").is_err());
    }

    #[test]
    fn test_parse_submit_dashes_inside_words() {
        assert_eq!(
            parse_line("submit sources/github/acme/my--repo feat--x -- Fix it").unwrap(),
            Some(Input::Intent(Intent::SubmitTask {
                task: "Fix it".into(),
                repository_id: "sources/github/acme/my--repo".into(),
                branch: Some("feat--x".into()),
            }))
        );
        assert_eq!(
            parse_line("submit sources/github/acme/web -- use --force").unwrap(),
            Some(Input::Intent(Intent::SubmitTask {
                task: "use --force".into(),
                repository_id: "sources/github/acme/web".into(),
                branch: None,
            }))
        );
        assert!(parse_line("submit sources/github/acme/web--Fix").is_err());
    }

    #[test]
    fn test_parse_tab_and_view() {
        assert_eq!(parse_line("tab 3").unwrap(), Some(Input::Tab(3)));
        assert!(parse_line("tab x").is_err());
        assert_eq!(
            parse_line("view history").unwrap(),
            Some(Input::Intent(Intent::SetView(ViewState::History)))
        );
        assert!(parse_line("view nowhere").is_err());
    }

    #[test]
    fn test_blank_and_unknown() {
        assert_eq!(parse_line("   ").unwrap(), None);
        assert!(parse_line("fly").is_err());
        assert_eq!(parse_line("quit").unwrap(), Some(Input::Quit));
    }
}
