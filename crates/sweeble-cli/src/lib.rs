// Library interface for sweeble-cli, so integration tests can reach the pieces
// the binary is assembled from.

pub mod app;
pub mod cli;
pub mod cursor;
pub mod report;

pub use cli::Cli;
pub use cursor::place_cursor;
pub use report::describe;
