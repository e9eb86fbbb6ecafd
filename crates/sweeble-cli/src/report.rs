use sweeble_core::{NoSuggestionReason, Preview, SessionEvent};

fn reason_text(reason: NoSuggestionReason) -> &'static str {
    match reason {
        NoSuggestionReason::Classified => "nothing to change here",
        NoSuggestionReason::Empty => "nothing usable came back",
        NoSuggestionReason::Unavailable => "assistant unavailable or too slow",
        NoSuggestionReason::Duplicate => "context unchanged",
    }
}

/// Human-readable summary of a published event.
pub fn describe(event: &SessionEvent, preview: Option<&Preview>) -> String {
    match event {
        SessionEvent::Inline { offset, text, .. } => {
            format!("Completion at offset {}:\n{}\n", offset, text)
        }
        SessionEvent::Edits { count, .. } => {
            let mut out = format!("{} edit(s) proposed:\n", count);
            if let Some(preview) = preview {
                out.push_str(&preview.diff);
            }
            out
        }
        SessionEvent::NoSuggestion { reason, .. } => format!("No suggestion: {}\n", reason_text(*reason)),
    }
}
