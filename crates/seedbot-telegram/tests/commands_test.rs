//! Command parsing and reply selection.

use seedbot_telegram::handlers::{parse_selection, summary_message, Command, TorrentAction};
use teloxide::utils::command::BotCommands;

fn parse(text: &str) -> Command {
    Command::parse(text, "seedbot").unwrap()
}

#[test]
fn test_aliases_parse_to_their_own_variants() {
    assert_eq!(parse("/s ubuntu iso"), Command::S("ubuntu iso".to_string()));
    assert_eq!(parse("/search ubuntu iso"), Command::Search("ubuntu iso".to_string()));
    assert_eq!(parse("/ls"), Command::Ls);
    assert_eq!(parse("/fs 1 2"), Command::Fs("1 2".to_string()));
    assert_eq!(parse("/del 4"), Command::Del("4".to_string()));
    assert_eq!(parse("/magnet magnet:?xt=1"), Command::Magnet("magnet:?xt=1".to_string()));
}

#[test]
fn test_force_start_keeps_underscore() {
    assert_eq!(parse("/force_start 7"), Command::ForceStart("7".to_string()));
}

#[test]
fn test_addressed_commands() {
    assert_eq!(parse("/list@seedbot"), Command::List);
}

#[test]
fn test_unknown_command_fails() {
    assert!(Command::parse("/connect x", "seedbot").is_err());
}

#[test]
fn test_aliases_hidden_from_descriptions() {
    let descriptions = Command::descriptions().to_string();
    assert!(descriptions.contains("/force_start"));
    assert!(!descriptions.contains("/fs"));
    assert!(!descriptions.contains("/ls"));
}

#[test]
fn test_reply_selection_and_summary() {
    assert_eq!(parse_selection("2"), Some(1));
    assert_eq!(
        summary_message(TorrentAction::Delete, &["X (ID: 1)".to_string(), "Y (ID: 2)".to_string()])
            .unwrap(),
        "Successfully deleted 2 torrents:\n- X (ID: 1)\n- Y (ID: 2)"
    );
}
