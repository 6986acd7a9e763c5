pub mod context;
pub mod decision;

pub use context::Envelope;
pub use decision::{Decision, DenyReason};

use crate::commands::CommandClassifier;
use crate::config::{Config, Mode, Settings};
use crate::roster::{self, GroupRoster};

/// The authorization engine: a classifier plus the roster used for admin checks.
///
/// Holds no per-call state; one `Gate` can serve concurrent decisions.
pub struct Gate<R> {
    classifier: CommandClassifier,
    roster: R,
}

/// Lowercase a command name and strip a leading `.`, `!` or `/` prefix.
pub fn normalize_command(name: &str) -> String {
    name.trim()
        .trim_start_matches(['.', '!', '/'])
        .to_ascii_lowercase()
}

impl<R: GroupRoster> Gate<R> {
    pub fn new(classifier: CommandClassifier, roster: R) -> Self {
        Self { classifier, roster }
    }

    /// Build the gate from the `[commands]` section of a config.
    pub fn from_config(config: &Config, roster: R) -> Self {
        Self::new(CommandClassifier::from_config(&config.commands), roster)
    }

    pub fn classifier(&self) -> &CommandClassifier {
        &self.classifier
    }

    pub fn roster(&self) -> &R {
        &self.roster
    }

    /// Decide whether the sender of `envelope` may run `command`.
    ///
    /// Rules are checked in order and the first one that fires wins:
    /// owner, owner-only, private mode, group-only, group-admin, allow.
    /// Never fails; a roster error denies admin-only commands.
    pub async fn decide(&self, settings: &Settings, envelope: &Envelope, command: &str) -> Decision {
        let cmd = normalize_command(command);
        let sender = envelope.sender();

        if !settings.owner.is_empty() && sender == settings.owner {
            log::debug!("{cmd}: owner {sender} bypasses all checks");
            return Decision::allow();
        }

        if self.classifier.is_owner_only(&cmd) {
            return deny(&cmd, sender, DenyReason::OwnerOnly);
        }

        if settings.mode == Mode::Private {
            return deny(&cmd, sender, DenyReason::PrivateMode);
        }

        if self.classifier.is_group_only(&cmd) && !envelope.is_group() {
            return deny(&cmd, sender, DenyReason::GroupOnly);
        }

        if self.classifier.is_group_admin_only(&cmd) {
            // Admin lookup uses the group-scoped participant id, not the bare sender.
            let admin = match envelope.participant_id.as_deref() {
                Some(participant) => {
                    roster::is_admin(&self.roster, &envelope.chat_id, participant).await
                }
                None => false,
            };
            if !admin {
                return deny(&cmd, sender, DenyReason::AdminOnly);
            }
        }

        Decision::allow()
    }

    /// Commands a menu should list for the sender of `envelope`.
    pub fn menu(&self, settings: &Settings, envelope: &Envelope) -> Vec<&str> {
        let is_owner = !settings.owner.is_empty() && envelope.sender() == settings.owner;
        self.classifier.visible(envelope.is_group(), is_owner)
    }
}

fn deny(cmd: &str, sender: &str, reason: DenyReason) -> Decision {
    log::debug!("{cmd}: denied for {sender}: {reason}");
    Decision::deny(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::{Participant, Role, RosterError, StaticRoster};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const GROUP: &str = "120363@g.us";

    fn settings(mode: Mode) -> Settings {
        Settings {
            owner: "111".into(),
            mode,
        }
    }

    /// Roster double that counts lookups and optionally fails.
    struct Scripted {
        calls: AtomicUsize,
        result: Result<Vec<Participant>, ()>,
    }

    impl Scripted {
        fn ok(participants: Vec<Participant>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                result: Ok(participants),
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                result: Err(()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GroupRoster for Scripted {
        async fn roster(&self, _chat_id: &str) -> Result<Vec<Participant>, RosterError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result
                .clone()
                .map_err(|_| RosterError::Transport("socket closed".into()))
        }
    }

    fn gate<R: GroupRoster>(roster: R) -> Gate<R> {
        Gate::from_config(&Config::default_config(), roster)
    }

    #[test]
    fn normalize_strips_prefix_and_case() {
        assert_eq!(normalize_command(".Kick"), "kick");
        assert_eq!(normalize_command("  !ping "), "ping");
        assert_eq!(normalize_command("menu"), "menu");
    }

    #[tokio::test]
    async fn owner_bypasses_everything_without_lookup() {
        let g = gate(Scripted::failing());
        let s = settings(Mode::Private);
        for cmd in ["kick", "autoviewonce", "tagall", "ping", "unknown"] {
            let d = g.decide(&s, &Envelope::direct("111@s.whatsapp.net"), cmd).await;
            assert_eq!(d, Decision::allow(), "direct {cmd}");
            let d = g.decide(&s, &Envelope::group(GROUP, "111@s.whatsapp.net"), cmd).await;
            assert_eq!(d, Decision::allow(), "group {cmd}");
        }
        assert_eq!(g.roster().calls(), 0);
    }

    #[tokio::test]
    async fn owner_only_fires_before_private_mode() {
        let g = gate(StaticRoster::new());
        let d = g
            .decide(&settings(Mode::Private), &Envelope::direct("222@s.whatsapp.net"), "autoviewonce")
            .await;
        assert_eq!(d, Decision::deny(DenyReason::OwnerOnly));
    }

    #[tokio::test]
    async fn private_mode_rejects_before_classification() {
        let g = gate(Scripted::ok(vec![Participant::new("333@s.whatsapp.net", Role::Admin)]));
        let s = settings(Mode::Private);
        for cmd in ["kick", "tagall", "ping", "unknown"] {
            let d = g.decide(&s, &Envelope::group(GROUP, "333@s.whatsapp.net"), cmd).await;
            assert_eq!(d, Decision::deny(DenyReason::PrivateMode), "{cmd}");
        }
        assert_eq!(g.roster().calls(), 0);
    }

    #[tokio::test]
    async fn group_only_in_direct_chat_skips_lookup() {
        let g = gate(Scripted::ok(vec![Participant::new("222@s.whatsapp.net", Role::Admin)]));
        let d = g
            .decide(&settings(Mode::Public), &Envelope::direct("222@s.whatsapp.net"), "kick")
            .await;
        assert_eq!(d, Decision::deny(DenyReason::GroupOnly));
        assert_eq!(g.roster().calls(), 0);
    }

    #[tokio::test]
    async fn admin_gate_queries_roster() {
        let g = gate(Scripted::ok(vec![
            Participant::new("333@s.whatsapp.net", Role::Admin),
            Participant::new("444@s.whatsapp.net", Role::None),
        ]));
        let s = settings(Mode::Public);
        let d = g.decide(&s, &Envelope::group(GROUP, "333@s.whatsapp.net"), "mute").await;
        assert_eq!(d, Decision::allow());
        let d = g.decide(&s, &Envelope::group(GROUP, "444@s.whatsapp.net"), "mute").await;
        assert_eq!(d, Decision::deny(DenyReason::AdminOnly));
        assert_eq!(g.roster().calls(), 2);
    }

    #[tokio::test]
    async fn lookup_failure_denies() {
        let g = gate(Scripted::failing());
        let d = g
            .decide(&settings(Mode::Public), &Envelope::group(GROUP, "333@s.whatsapp.net"), "kick")
            .await;
        assert_eq!(d, Decision::deny(DenyReason::AdminOnly));
    }

    #[tokio::test]
    async fn admin_only_without_participant_denies_without_lookup() {
        let commands = crate::config::Commands {
            group_admin: vec!["warn".into()],
            ..Default::default()
        };
        let g = Gate::new(
            CommandClassifier::from_config(&commands),
            Scripted::ok(vec![Participant::new("222@s.whatsapp.net", Role::Admin)]),
        );
        let d = g
            .decide(&settings(Mode::Public), &Envelope::direct("222@s.whatsapp.net"), "warn")
            .await;
        assert_eq!(d, Decision::deny(DenyReason::AdminOnly));
        assert_eq!(g.roster().calls(), 0);
    }

    #[tokio::test]
    async fn general_and_unknown_commands_allowed_in_public() {
        let g = gate(Scripted::failing());
        let s = settings(Mode::Public);
        let direct = Envelope::direct("222@s.whatsapp.net");
        assert_eq!(g.decide(&s, &direct, "ping").await, Decision::allow());
        assert_eq!(g.decide(&s, &direct, "weather").await, Decision::allow());
        let group = Envelope::group(GROUP, "222@s.whatsapp.net");
        assert_eq!(g.decide(&s, &group, "tagall").await, Decision::allow());
        assert_eq!(g.roster().calls(), 0);
    }

    #[tokio::test]
    async fn empty_owner_matches_nobody() {
        let g = gate(StaticRoster::new());
        let s = Settings {
            owner: String::new(),
            mode: Mode::Private,
        };
        let d = g.decide(&s, &Envelope::direct("@s.whatsapp.net"), "ping").await;
        assert_eq!(d, Decision::deny(DenyReason::PrivateMode));
    }

    #[test]
    fn menu_depends_on_context() {
        let g = gate(StaticRoster::new());
        let s = settings(Mode::Public);
        let owner_direct = g.menu(&s, &Envelope::direct("111@s.whatsapp.net"));
        assert!(owner_direct.contains(&"autoviewonce"));
        let member_group = g.menu(&s, &Envelope::group(GROUP, "222@s.whatsapp.net"));
        assert!(member_group.contains(&"kick"));
        assert!(!member_group.contains(&"autoviewonce"));
    }
}
