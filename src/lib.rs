#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::assigning_clones,
    clippy::bool_to_int_with_if,
    clippy::case_sensitive_file_extension_comparisons,
    clippy::cast_possible_wrap,
    clippy::doc_markdown,
    clippy::field_reassign_with_default,
    clippy::float_cmp,
    clippy::implicit_clone,
    clippy::items_after_statements,
    clippy::map_unwrap_or,
    clippy::manual_let_else,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::needless_pass_by_value,
    clippy::needless_raw_string_hashes,
    clippy::redundant_closure_for_method_calls,
    clippy::return_self_not_must_use,
    clippy::similar_names,
    clippy::single_match_else,
    clippy::struct_field_names,
    clippy::too_many_lines,
    clippy::uninlined_format_args,
    clippy::unnecessary_cast,
    clippy::unnecessary_lazy_evaluations,
    clippy::unnecessary_literal_bound,
    clippy::unnecessary_map_or,
    clippy::unused_self,
    clippy::cast_precision_loss,
    clippy::unnecessary_wraps
)]

use clap::Subcommand;

pub mod config;
pub mod messages;
pub mod sessions;

pub use config::Config;
pub use messages::{Content, Message, Role};

/// Session management subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SessionCommands {
    /// List sessions, most recently modified first
    List {
        /// Maximum number of sessions to display
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Print the messages of a session
    Show {
        /// Session name
        name: String,
        /// Only show the last N messages
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print the file path for a session (creates the sessions directory)
    Path {
        /// Session name
        name: String,
    },
    /// Print the name of the most recently modified session
    Latest,
    /// Append a message to a session
    #[command(long_about = "\
Append a message to a session.

Without --name, --resume continues the most recently modified \
session; otherwise a fresh session name is generated. The name of \
the session written to is printed on stdout.

Examples:
  sessionfile session append --name project-x \"Summarize the diff\"
  sessionfile session append --resume --role assistant \"Done.\"
  sessionfile session append \"Start something new\"")]
    Append {
        /// Session name (e.g. 'project-x')
        #[arg(short, long)]
        name: Option<String>,
        /// Continue the most recently modified session when no name is given
        #[arg(short, long)]
        resume: bool,
        /// Message author (user or assistant)
        #[arg(long, default_value = "user")]
        role: Role,
        /// Message text
        text: String,
    },
}
