use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "sweeble")]
#[command(about = "Sweeble - next-edit suggestions for a source file")]
#[command(version)]
pub struct Cli {
    /// Source file to analyse. A [CURSOR_HERE] marker in it sets the cursor.
    pub file: PathBuf,

    /// Cursor as a character offset
    #[arg(long, conflicts_with = "at")]
    pub offset: Option<usize>,

    /// Cursor as LINE:COL, both 1-based
    #[arg(long, value_parser = crate::cursor::parse_line_col)]
    pub at: Option<(usize, usize)>,

    /// Accept the suggestion and write the result back to the file
    #[arg(long)]
    pub apply: bool,

    /// Model used for completions and edit proposals
    #[arg(short, long)]
    pub model: Option<String>,

    /// Settings file to use instead of the default location
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Run even if the file is git-ignored
    #[arg(long)]
    pub include_ignored: bool,

    /// Debug logging for sweeble crates
    #[arg(short, long)]
    pub verbose: bool,
}
