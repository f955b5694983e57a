use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use studysyncapp::model::RecordKind;

#[derive(Parser, Debug)]
#[command(
    name = "studysync",
    bin_name = "studysync",
    version,
    disable_help_subcommand = true,
    after_help = "Settings come from studysync.toml and STUDYSYNC_* variables.\nRun `studysync config` to see what is in effect."
)]
#[command(about = "Notes, flashcards and quizzes that stay on your device", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true, value_name = "PATH", help_heading = "Options")]
    pub config: Option<PathBuf>,

    /// Print JSON instead of formatted text
    #[arg(long, global = true, help_heading = "Options")]
    pub json: bool,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Note,
    Flashcard,
    Quiz,
}

impl From<KindArg> for RecordKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Note => RecordKind::Note,
            KindArg::Flashcard => RecordKind::Flashcard,
            KindArg::Quiz => RecordKind::Quiz,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum VoteTarget {
    Post,
    Comment,
}

/// Record content. Which flags apply depends on `--kind`.
#[derive(Args, Debug, Default, Clone)]
pub struct ContentArgs {
    /// Short description shown under the title
    #[arg(long)]
    pub description: Option<String>,

    /// Note body (notes)
    #[arg(long)]
    pub content: Option<String>,

    /// A card as FRONT=BACK, repeatable (flashcards)
    #[arg(long = "card", value_name = "FRONT=BACK")]
    pub cards: Vec<String>,

    /// JSON file with an array of questions (quizzes)
    #[arg(long, value_name = "FILE")]
    pub questions: Option<PathBuf>,

    /// Shuffle question order (quizzes)
    #[arg(long)]
    pub randomized: bool,

    /// Keep question order fixed (quizzes)
    #[arg(long, conflicts_with = "randomized")]
    pub ordered: bool,

    /// Time limit hours (quizzes)
    #[arg(long, value_name = "N")]
    pub hours: Option<String>,

    /// Time limit minutes (quizzes)
    #[arg(long, value_name = "N")]
    pub minutes: Option<String>,

    /// Time limit seconds (quizzes)
    #[arg(long, value_name = "N")]
    pub seconds: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(flatten)]
    Collection(CollectionCommands),

    #[command(flatten)]
    Forum(ForumCommands),

    #[command(flatten)]
    Misc(MiscCommands),
}

#[derive(Subcommand, Debug)]
pub enum CollectionCommands {
    /// List cached records
    #[command(alias = "ls", display_order = 1)]
    List {
        #[arg(long, short, value_enum, default_value = "note")]
        kind: KindArg,
    },

    /// Show one record
    #[command(alias = "v", display_order = 2)]
    Show {
        #[arg(long, short, value_enum, default_value = "note")]
        kind: KindArg,

        id: String,
    },

    /// Create a record on the server and cache it
    #[command(alias = "n", display_order = 3)]
    Create {
        #[arg(long, short, value_enum, default_value = "note")]
        kind: KindArg,

        /// Title words (joined with spaces)
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,

        #[command(flatten)]
        content: ContentArgs,
    },

    /// Edit a cached record; fields not given keep their current value
    #[command(alias = "e", display_order = 4)]
    Update {
        #[arg(long, short, value_enum, default_value = "note")]
        kind: KindArg,

        id: String,

        /// New title words (omit to keep the title)
        #[arg(num_args = 0..)]
        title: Vec<String>,

        #[command(flatten)]
        content: ContentArgs,
    },

    /// Delete a record
    #[command(alias = "rm", display_order = 5)]
    Delete {
        #[arg(long, short, value_enum, default_value = "note")]
        kind: KindArg,

        id: String,
    },

    /// Make a record public or private
    #[command(display_order = 6)]
    Visibility {
        #[arg(long, short, value_enum, default_value = "note")]
        kind: KindArg,

        id: String,

        #[arg(value_enum)]
        state: Visibility,
    },

    /// Score an attempt at a cached quiz
    #[command(display_order = 7)]
    Score {
        quiz_id: String,

        /// One answer per question: option indexes like 0 or 0,2; "-" for none
        #[arg(required = true, num_args = 1..)]
        answers: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ForumCommands {
    /// Comment on a forum post
    #[command(display_order = 10)]
    Comment {
        post_id: String,

        /// Comment text (joined with spaces)
        #[arg(required = true, num_args = 1..)]
        body: Vec<String>,

        /// Reply to this comment instead of the post
        #[arg(long, value_name = "COMMENT_ID")]
        reply_to: Option<String>,
    },

    /// Edit a forum post
    #[command(display_order = 11)]
    EditPost {
        post_id: String,

        #[arg(long)]
        title: String,

        #[arg(long)]
        body: String,
    },

    /// Delete a forum post
    #[command(display_order = 12)]
    DeletePost { post_id: String },

    /// Vote on a post or comment (1 up, -1 down, 0 clear)
    #[command(display_order = 13)]
    Vote {
        #[arg(value_enum)]
        target: VoteTarget,

        id: String,

        #[arg(allow_hyphen_values = true)]
        value: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum MiscCommands {
    /// Show the badge catalog
    #[command(display_order = 20)]
    Badges {
        /// Ask the server which badges were just earned
        #[arg(long)]
        check: bool,
    },

    /// Print the configuration in effect
    #[command(display_order = 21)]
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_create_with_cards() {
        let cli = Cli::try_parse_from([
            "studysync",
            "create",
            "--kind",
            "flashcard",
            "Spanish",
            "verbs",
            "--card",
            "ser=to be",
            "--card",
            "tener=to have",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Collection(CollectionCommands::Create {
                kind,
                title,
                content,
            })) => {
                assert_eq!(kind, KindArg::Flashcard);
                assert_eq!(title.join(" "), "Spanish verbs");
                assert_eq!(content.cards, vec!["ser=to be", "tener=to have"]);
            }
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn test_update_title_is_optional() {
        let cli = Cli::try_parse_from(["studysync", "update", "n1", "--content", "ATP"]).unwrap();
        match cli.command {
            Some(Commands::Collection(CollectionCommands::Update {
                id, title, content, ..
            })) => {
                assert_eq!(id, "n1");
                assert!(title.is_empty());
                assert_eq!(content.content.as_deref(), Some("ATP"));
            }
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn test_randomized_and_ordered_conflict() {
        let parsed = Cli::try_parse_from([
            "studysync",
            "update",
            "--kind",
            "quiz",
            "q1",
            "--randomized",
            "--ordered",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_negative_vote_is_not_a_flag() {
        let cli = Cli::try_parse_from(["studysync", "vote", "post", "p1", "-1"]).unwrap();
        match cli.command {
            Some(Commands::Forum(ForumCommands::Vote { target, id, value })) => {
                assert_eq!(target, VoteTarget::Post);
                assert_eq!(id, "p1");
                assert_eq!(value, "-1");
            }
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn test_kind_defaults_to_note() {
        let cli = Cli::try_parse_from(["studysync", "ls"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Collection(CollectionCommands::List {
                kind: KindArg::Note
            }))
        ));
    }
}
