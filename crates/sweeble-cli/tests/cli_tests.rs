use clap::Parser;
use sweeble_cli::cursor::parse_line_col;
use sweeble_cli::{describe, place_cursor, Cli};
use sweeble_core::coordinator::GenerationCounter;
use sweeble_core::{NoSuggestionReason, Preview, SessionEvent};

// ========================================================================
// Cursor placement
// ========================================================================

#[test]
fn test_parse_line_col() {
    assert_eq!(parse_line_col("3:7").unwrap(), (3, 7));
    assert!(parse_line_col("0:1").is_err());
    assert!(parse_line_col("12").is_err());
    assert!(parse_line_col("a:b").is_err());
}

#[test]
fn test_cursor_defaults_to_end_of_file() {
    let (text, cursor) = place_cursor("let x = 1;\n", None, None).unwrap();
    assert_eq!(text, "let x = 1;\n");
    assert_eq!(cursor, 11);
}

#[test]
fn test_marker_sets_cursor_and_is_stripped() {
    let (text, cursor) = place_cursor("let é = [CURSOR_HERE]1;", None, None).unwrap();
    assert_eq!(text, "let é = 1;");
    assert_eq!(cursor, 8);
}

#[test]
fn test_explicit_position_beats_marker() {
    let (text, cursor) = place_cursor("ab[CURSOR_HERE]cd", Some(1), None).unwrap();
    assert_eq!(text, "abcd");
    assert_eq!(cursor, 1);
}

#[test]
fn test_line_col_resolves_to_char_offset() {
    let text = "fn a() {\n    retrn x;\n}";
    let (_, cursor) = place_cursor(text, None, Some((2, 5))).unwrap();
    assert_eq!(cursor, 13);
    assert_eq!(&text[cursor..cursor + 5], "retrn");

    let (_, end_of_line) = place_cursor(text, None, Some((3, 2))).unwrap();
    assert_eq!(end_of_line, text.chars().count());
}

#[test]
fn test_out_of_range_positions_are_errors() {
    assert!(place_cursor("abc", Some(4), None).is_err());
    assert!(place_cursor("abc\nd", None, Some((3, 1))).is_err());
    assert!(place_cursor("abc\nd", None, Some((2, 3))).is_err());
}

// ========================================================================
// Argument parsing
// ========================================================================

#[test]
fn test_cli_parses_flags() {
    let cli = Cli::try_parse_from(["sweeble", "src/main.rs", "--at", "4:2", "--apply", "-m", "gpt-4o", "-v"]).unwrap();
    assert_eq!(cli.file.to_str(), Some("src/main.rs"));
    assert_eq!(cli.at, Some((4, 2)));
    assert!(cli.apply);
    assert!(cli.verbose);
    assert_eq!(cli.model.as_deref(), Some("gpt-4o"));
    assert!(cli.config.is_none());
}

#[test]
fn test_offset_and_at_conflict() {
    assert!(Cli::try_parse_from(["sweeble", "a.rs", "--offset", "3", "--at", "1:1"]).is_err());
}

#[test]
fn test_file_is_required() {
    assert!(Cli::try_parse_from(["sweeble"]).is_err());
}

// ========================================================================
// Output
// ========================================================================

#[test]
fn test_describe_events() {
    let generation = GenerationCounter::new().advance();

    let inline = SessionEvent::Inline {
        generation,
        offset: 4,
        text: "return x;".into(),
    };
    assert_eq!(describe(&inline, None), "Completion at offset 4:\nreturn x;\n");

    let preview = Preview {
        text: String::new(),
        diff: "-a\n+b\n".into(),
    };
    let edits = SessionEvent::Edits { generation, count: 2 };
    assert_eq!(describe(&edits, Some(&preview)), "2 edit(s) proposed:\n-a\n+b\n");

    let none = SessionEvent::NoSuggestion {
        generation,
        reason: NoSuggestionReason::Unavailable,
    };
    assert!(describe(&none, None).starts_with("No suggestion: assistant unavailable"));
}

// ========================================================================
// Run
// ========================================================================

#[tokio::test]
async fn test_run_without_api_key_fails_before_touching_file() {
    let tmp = tempfile::TempDir::new().unwrap();
    let config = tmp.path().join("config.toml");
    std::fs::write(&config, "[openai]\napi_key_env = \"SWEEBLE_CLI_TEST_NO_KEY\"\n").unwrap();
    let source = tmp.path().join("main.rs");
    std::fs::write(&source, "fn main() {}\n").unwrap();

    let cli = Cli::try_parse_from([
        "sweeble",
        source.to_str().unwrap(),
        "--apply",
        "--config",
        config.to_str().unwrap(),
    ])
    .unwrap();
    let err = sweeble_cli::app::run(cli).await.unwrap_err();
    assert!(err.to_string().contains("SWEEBLE_CLI_TEST_NO_KEY"));
    assert_eq!(std::fs::read_to_string(&source).unwrap(), "fn main() {}\n");
}
