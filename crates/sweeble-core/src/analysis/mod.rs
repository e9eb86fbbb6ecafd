mod heuristics;

pub use heuristics::{AnalysisHints, ContextAnalyzer, HeuristicAnalyzer, Issue, LogicalUnit, Severity};
