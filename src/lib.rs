//! chatgate: command authorization for chat bots.
//!
//! Given a command invocation, decides whether its sender may run it based on
//! ownership, the bot's operating mode, group membership and group-admin
//! role. The answer is a [`eval::Decision`]: allowed, or denied with a short
//! reason suitable for showing to the user.
//!
//! # Architecture
//!
//! - **[`commands`]** — Command classifier: owner-only, group-admin, group-only and general sets.
//! - **[`eval`]** — Envelope and sender resolution, decision types, the ordered [`eval::Gate`].
//! - **[`roster`]** — Group roster trait, admin-role resolution, timeout and cache adapters.
//! - **[`config`]** — Configuration loading: embedded defaults + user overlay merge.
//! - **[`logging`]** — Logger setup and decision records in `~/.local/share/chatgate/decisions.log`.

/// Command classification sets and menu filtering.
pub mod commands;
/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// Decision engine: envelope, decision types, rule chain.
pub mod eval;
/// Logger setup and decision records.
pub mod logging;
/// Group rosters and admin-role lookups.
pub mod roster;

use eval::{Decision, Envelope};
use roster::GroupRoster;

/// Build a gate from `config` and evaluate one command.
///
/// This is the main entry point for tests and simple usage. Long-running
/// hosts should build a [`eval::Gate`] once and reuse it.
pub async fn decide<R: GroupRoster>(
    config: &config::Config,
    roster: R,
    envelope: &Envelope,
    command: &str,
) -> Decision {
    let gate = eval::Gate::from_config(config, roster);
    gate.decide(&config.settings, envelope, command).await
}
