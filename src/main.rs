//! chatgate: command authorization check for chat bot hosts.
//!
//! Reads one JSON request from stdin, writes the decision as JSON to stdout.
//!
//! Request:
//!   {"chat_id": "...", "participant_id": "...", "command": ".kick",
//!    "roster": [{"id": "...", "role": "admin"}]}
//!
//! `participant_id` is present only for group messages. `roster` lists the
//! group's participants; when absent, admin-only commands are denied.
//!
//! Flags:
//!   -v, --verbose   debug logging to stderr
//!   --menu          print the commands visible to the sender instead

use std::io::Read;

use serde::Deserialize;
use serde_json::{Value, json};

use chatgate::config::Config;
use chatgate::eval::{Envelope, Gate};
use chatgate::logging;
use chatgate::roster::{Participant, StaticRoster};

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(flatten)]
    envelope: Envelope,
    command: Option<String>,
    roster: Option<Vec<Participant>>,
}

impl Request {
    /// In-memory roster holding the request's participants, if any.
    fn roster(&self) -> StaticRoster {
        match &self.roster {
            Some(participants) => {
                StaticRoster::new().with_group(self.envelope.chat_id.clone(), participants.clone())
            }
            None => StaticRoster::new(),
        }
    }
}

fn parse_request(input: &str) -> Result<Request, String> {
    serde_json::from_str(input).map_err(|e| format!("JSON parse error: {e}"))
}

/// Evaluate a request and build the JSON answer.
///
/// A decide request without a non-empty `command` is an error.
async fn respond(config: &Config, request: &Request, menu: bool) -> Result<Value, String> {
    let gate = Gate::from_config(config, request.roster());

    if menu {
        return Ok(json!({ "commands": gate.menu(&config.settings, &request.envelope) }));
    }

    let command = match request.command.as_deref().map(str::trim) {
        Some(c) if !c.is_empty() => c,
        _ => return Err("request is missing \"command\"".into()),
    };
    let decision = gate.decide(&config.settings, &request.envelope, command).await;
    logging::log_decision(&request.envelope, command, &decision);
    Ok(json!(decision))
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let verbose = args.iter().any(|a| a == "-v" || a == "--verbose");
    let menu = args.iter().any(|a| a == "--menu");

    logging::init(verbose);

    let mut input = String::new();
    if std::io::stdin().read_to_string(&mut input).is_err() {
        eprintln!("failed to read stdin");
        std::process::exit(1);
    }

    let config = Config::load();
    let output = match parse_request(&input) {
        Ok(request) => respond(&config, &request, menu).await,
        Err(e) => Err(e),
    };

    match output {
        Ok(value) => println!("{value}"),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

// ─── Tests ───────────────────────────────────────────
