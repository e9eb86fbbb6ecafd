use serde_json::{json, Value};

use crate::constants::CURSOR_MARKER;
use crate::context::PromptContext;

pub fn classification_system() -> String {
    format!(
        "You decide what kind of help a programmer needs at the {CURSOR_MARKER} marker.\n\
         Answer SIMPLE_INSERTION when the code can be finished by typing at the marker only,\n\
         COMPLEX_EDIT when code near the marker is wrong and has to be rewritten (typos, wrong\n\
         types, broken calls), and NO_SUGGESTION when the code around the marker is already complete.\n\n\
         Examples:\n\
         'public void test{CURSOR_MARKER}' -> SIMPLE_INSERTION\n\
         'public void test() {{ {CURSOR_MARKER} }}' -> SIMPLE_INSERTION\n\
         'int x = String.parseInt{CURSOR_MARKER}' -> COMPLEX_EDIT\n\
         'retrn x;{CURSOR_MARKER}' -> COMPLEX_EDIT\n\
         'public void test() {{ return; {CURSOR_MARKER} }}' -> NO_SUGGESTION"
    )
}

pub fn completion_system(language: &str) -> String {
    format!(
        "You are an expert {language} programmer completing code at the {CURSOR_MARKER} marker.\n\
         - Only add code at the marker. Code before and after it must stay exactly as it is.\n\
         - Continue the current statement, block or member and stop when it is complete.\n\
         - Include newlines and indentation when the insertion spans lines or starts a new line.\n\
         - If no valid completion can be made by insertion alone, return nothing.\n\
         - Return only the code to insert. No explanations, no markdown."
    )
}

pub fn proposal_system(language: &str) -> String {
    format!(
        "You are an expert {language} programmer fixing the code around the {CURSOR_MARKER} marker.\n\
         Report each change as an object with:\n\
         - type: INSERT, REPLACE or DELETE\n\
         - oldText: the exact existing text to replace or delete, copied verbatim from the input\n\
           (empty for an INSERT at the marker)\n\
         - newText: the complete corrected line(s), with indentation and newlines\n\
         - confidence: a number between 0.0 and 1.0\n\
         Prefer whole lines or statements over fragments. Return an empty list when nothing is wrong."
    )
}

pub fn user_prompt(context: &PromptContext) -> String {
    format!("Language: {}\n\n{}", context.language, context.text)
}

pub fn classification_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "classification": {
                "type": "string",
                "enum": ["SIMPLE_INSERTION", "COMPLEX_EDIT", "NO_SUGGESTION"]
            }
        },
        "required": ["classification"],
        "additionalProperties": false
    })
}

pub fn proposal_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "changes": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "type": { "type": "string", "enum": ["INSERT", "REPLACE", "DELETE"] },
                        "oldText": { "type": "string" },
                        "newText": { "type": "string" },
                        "confidence": { "type": "number" }
                    },
                    "required": ["type", "oldText", "newText", "confidence"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["changes"],
        "additionalProperties": false
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_mention_marker_and_language() {
        assert!(classification_system().contains(CURSOR_MARKER));
        assert!(completion_system("Rust").contains("expert Rust programmer"));
        assert!(proposal_system("Java").contains("oldText"));
    }

    #[test]
    fn test_schemas_list_all_labels() {
        let labels = &classification_schema()["properties"]["classification"]["enum"];
        assert_eq!(labels.as_array().unwrap().len(), 3);
        let item = &proposal_schema()["properties"]["changes"]["items"];
        assert_eq!(item["required"].as_array().unwrap().len(), 4);
    }
}
