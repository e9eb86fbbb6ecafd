//! Sweeble centralized constants.
//! Magic strings, default models, timings and limits live here.

/// Token marking the cursor inside prompt context. Stripped from anchors before matching.
pub const CURSOR_MARKER: &str = "[CURSOR_HERE]";

// ─── Models ───────────────────────────────────────────────────────────────────

pub mod models {
    /// Model used for completions and edit proposals.
    pub const COMPLETION_MODEL: &str = "gpt-4o";
    /// Small model used for the classification round-trip.
    pub const CLASSIFICATION_MODEL: &str = "gpt-4o-mini";
}

// ─── API Endpoints ────────────────────────────────────────────────────────────

pub mod endpoints {
    pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
    pub const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";
    pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
}

// ─── Timing ───────────────────────────────────────────────────────────────────

pub mod timing {
    pub const DEBOUNCE_MS: u64 = 300;
    pub const CLASSIFICATION_TIMEOUT_MS: u64 = 3000;
    pub const COMPLETION_TIMEOUT_MS: u64 = 5000;
    pub const PROPOSAL_TIMEOUT_MS: u64 = 5000;
    pub const CONNECT_TIMEOUT_MS: u64 = 3000;
}

// ─── Request Limits ───────────────────────────────────────────────────────────

pub mod limits {
    /// Characters of context captured on each side of the cursor.
    pub const CONTEXT_WINDOW_CHARS: usize = 500;
    /// Characters scanned on each side of the cursor by the heuristic analyzer.
    pub const ANALYSIS_WINDOW_CHARS: usize = 200;
    /// Differing characters tolerated by the fuzzy anchor tiers.
    pub const TYPO_TOLERANCE: usize = 2;

    pub const CLASSIFICATION_MAX_TOKENS: u32 = 10;
    pub const COMPLETION_MAX_TOKENS: u32 = 100;
    pub const PROPOSAL_MAX_TOKENS: u32 = 500;

    pub const CLASSIFICATION_TEMPERATURE: f32 = 0.0;
    pub const COMPLETION_TEMPERATURE: f32 = 0.3;
    pub const PROPOSAL_TEMPERATURE: f32 = 0.2;
}

// ─── Config Paths ─────────────────────────────────────────────────────────────

pub mod paths {
    pub const CONFIG_DIR: &str = "sweeble";
    pub const CONFIG_FILE: &str = "config.toml";
}
