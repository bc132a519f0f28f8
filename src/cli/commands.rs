//! CLI command definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

use crate::models::GradeLevel;

#[derive(Parser)]
#[command(name = "flashgen")]
#[command(about = "Generate flashcards for any topic with web-grounded Gemini")]
#[command(version)]
pub struct Cli {
    /// Enable verbose debug logging (default: info level)
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file (default: config.toml, then config.example.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the generation API server
    Serve {
        /// Host to bind to (default: from config)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind to (default: from config)
        #[arg(short, long)]
        port: Option<u16>,
        /// Enable CORS
        #[arg(long)]
        cors: bool,
    },
    /// Generate flashcards and print them as they stream in
    Generate {
        /// Topic, e.g. "World War II" or "Photosynthesis"
        topic: Option<String>,
        /// Number of flashcards (1-30)
        #[arg(short = 'n', long, default_value = "10", allow_negative_numbers = true)]
        count: i64,
        /// Grade level
        #[arg(short, long, value_enum, default_value = "middle")]
        grade: GradeArg,
        /// Gemini API key; saved for later runs
        #[arg(long)]
        api_key: Option<String>,
        /// Server root URL (default: from config)
        #[arg(long)]
        endpoint: Option<String>,
        /// Save the cards as flashcards.txt in this directory
        #[arg(long)]
        download: Option<PathBuf>,
        /// Copy the cards to the terminal clipboard
        #[arg(long)]
        copy: bool,
    },
    /// Manage the saved Gemini API key
    #[command(subcommand)]
    Key(KeyCommands),
    /// Show current configuration
    Config,
}

#[derive(Subcommand)]
pub enum KeyCommands {
    /// Save a key
    Set {
        /// The Gemini API key
        key: String,
    },
    /// Show the saved key, masked
    Show,
    /// Forget the saved key
    Clear,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum GradeArg {
    /// Elementary School (Grades 1-5)
    Elementary,
    /// Middle School (Grades 6-8)
    Middle,
    /// High School (Grades 9-12)
    #[value(name = "highschool")]
    HighSchool,
    /// College Level
    College,
    /// Advanced/Professional
    Advanced,
}

impl From<GradeArg> for GradeLevel {
    fn from(arg: GradeArg) -> Self {
        match arg {
            GradeArg::Elementary => Self::Elementary,
            GradeArg::Middle => Self::Middle,
            GradeArg::HighSchool => Self::HighSchool,
            GradeArg::College => Self::College,
            GradeArg::Advanced => Self::Advanced,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generate() {
        let cli = Cli::parse_from([
            "flashgen",
            "generate",
            "Photosynthesis",
            "-n",
            "5",
            "--grade",
            "elementary",
        ]);
        match cli.command {
            Commands::Generate {
                topic, count, grade, copy, ..
            } => {
                assert_eq!(topic.as_deref(), Some("Photosynthesis"));
                assert_eq!(count, 5);
                assert_eq!(GradeLevel::from(grade), GradeLevel::Elementary);
                assert!(!copy);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_generate_defaults() {
        let cli = Cli::parse_from(["flashgen", "generate", "--grade", "highschool", "-n", "-3"]);
        match cli.command {
            Commands::Generate {
                topic, count, grade, ..
            } => {
                assert!(topic.is_none());
                assert_eq!(count, -3);
                assert_eq!(GradeLevel::from(grade), GradeLevel::HighSchool);
            }
            _ => panic!("expected generate"),
        }

        let cli = Cli::parse_from(["flashgen", "generate", "Tides"]);
        assert!(matches!(
            cli.command,
            Commands::Generate { count: 10, grade: GradeArg::Middle, .. }
        ));
    }

    #[test]
    fn test_parse_key_and_global_config() {
        let cli = Cli::parse_from(["flashgen", "key", "set", "AIza", "--config", "alt.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("alt.toml")));
        assert!(matches!(cli.command, Commands::Key(KeyCommands::Set { .. })));
    }
}
