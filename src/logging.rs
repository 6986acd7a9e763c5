use std::path::{Path, PathBuf};

use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};

use crate::eval::{Decision, Envelope};

/// Log target used for per-decision audit records.
pub const DECISION_TARGET: &str = "chatgate::decision";

/// Directory holding `decisions.log`: ~/.local/share/chatgate.
pub fn log_dir() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(Path::new(&home).join(".local/share/chatgate"))
}

/// Install the global logger: warnings (or everything at debug when
/// `verbose`) to stderr, plus decision records appended to
/// ~/.local/share/chatgate/decisions.log.
///
/// Best-effort: if the log file or the logger cannot be set up, the host
/// carries on without it.
pub fn init(verbose: bool) {
    let term_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let config = ConfigBuilder::new().set_time_format_rfc3339().build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    loggers.push(TermLogger::new(
        term_level,
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ));

    if let Some(file) = log_dir().and_then(|dir| open_log(&dir)) {
        loggers.push(WriteLogger::new(LevelFilter::Info, config, file));
    }

    // Already initialised (tests, embedding hosts) is fine.
    let _ = CombinedLogger::init(loggers);
}

fn open_log(dir: &Path) -> Option<std::fs::File> {
    std::fs::create_dir_all(dir).ok()?;
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("decisions.log"))
        .ok()
}

/// Format one tab-separated decision record.
pub fn decision_record(envelope: &Envelope, command: &str, decision: &Decision) -> String {
    let cmd: String = command.chars().take(64).collect();
    format!(
        "{decision}\t{chat}\t{sender}\t{cmd}\t{reason}",
        decision = decision.label(),
        chat = envelope.chat_id,
        sender = envelope.sender(),
        reason = decision.reason.map(|r| r.as_str()).unwrap_or("-"),
    )
}

/// Emit a decision record at info level on [`DECISION_TARGET`].
pub fn log_decision(envelope: &Envelope, command: &str, decision: &Decision) {
    log::info!(target: DECISION_TARGET, "{}", decision_record(envelope, command, decision));
}
