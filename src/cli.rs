use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use anyhow::Result;
use crate::core::data::FeedbackAnswer;
use crate::manager::{Session, account, cache, course, exercise};

#[derive(Parser)]
#[command(name = "tmc")]
#[command(about = "Command line client for TestMyCode course servers")]
#[command(version)]
pub struct Cli {
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count, help = "Increase log verbosity")]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Commands {
    pub async fn execute(self, session: &mut Session) -> Result<()> {
        match self {
            Commands::Login(args) => account::handle_login(session, &args).await,
            Commands::Logout => account::handle_logout(session).await,
            Commands::Server(args) => account::handle_server(session, &args).await,
            Commands::Courses => course::handle_courses(session).await,
            Commands::Exercises(args) => course::handle_exercises(session, &args).await,
            Commands::Download(args) => course::handle_download(session, &args).await,
            Commands::Updates(args) => course::handle_updates(session, &args).await,
            Commands::Reviews(args) => course::handle_reviews(session, &args).await,
            Commands::Submit(args) => exercise::handle_submit(session, &args).await,
            Commands::Test(args) => exercise::handle_test(session, &args).await,
            Commands::Paste(args) => exercise::handle_paste(session, &args).await,
            Commands::Feedback(args) => exercise::handle_feedback(session, args).await,
            Commands::Cache(args) => cache::handle_cache_command(session, args.command),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in to the selected server
    Login(LoginArgs),

    /// Forget stored credentials
    Logout,

    /// Select the course server
    Server(ServerArgs),

    /// List available courses
    Courses,

    /// List exercises of the course in the given directory
    Exercises(PathArgs),

    /// Download the exercises of a course
    Download(DownloadArgs),

    /// Show exercises that are new or updated since the last download
    Updates(CourseArgs),

    /// Show unread code reviews of a course
    Reviews(CourseArgs),

    /// Submit an exercise for grading
    Submit(PathArgs),

    /// Run an exercise's tests locally
    Test(PathArgs),

    /// Upload an exercise as a paste
    Paste(PathArgs),

    /// Answer a feedback questionnaire
    Feedback(FeedbackArgs),

    /// Cache file management
    Cache(CacheArgs),
}

#[derive(Args)]
pub struct LoginArgs {
    #[arg(short, long)]
    pub username: String,

    #[arg(
        short,
        long,
        help = "Password (falls back to TMC_PASSWORD). Only the username is saved; later runs read the password from TMC_PASSWORD"
    )]
    pub password: Option<String>,
}

#[derive(Args)]
pub struct ServerArgs {
    #[arg(help = "Server address, e.g. https://tmc.mooc.fi")]
    pub url: String,
}

#[derive(Args)]
pub struct PathArgs {
    #[arg(default_value = ".", help = "Directory inside a downloaded course")]
    pub path: PathBuf,
}

#[derive(Args)]
pub struct DownloadArgs {
    #[arg(help = "Course ID")]
    pub course_id: String,

    #[arg(short, long, default_value = ".", help = "Directory to download into")]
    pub path: PathBuf,
}

#[derive(Args)]
pub struct CourseArgs {
    #[arg(help = "Course ID or name")]
    pub course: String,
}

#[derive(Args)]
pub struct FeedbackArgs {
    #[arg(help = "Feedback address of the exercise")]
    pub url: String,

    #[arg(short, long = "answer", value_parser = parse_answer, help = "Answer as QUESTION_ID=TEXT")]
    pub answers: Vec<FeedbackAnswer>,
}

#[derive(Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommands,
}

#[derive(Subcommand, Clone)]
pub enum CacheCommands {
    /// Move the cache to another file, keeping its content
    Set {
        file: PathBuf,
    },

    /// Show the active cache file
    Show,
}

fn parse_answer(raw: &str) -> Result<FeedbackAnswer, String> {
    let (id, answer) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected QUESTION_ID=TEXT, got '{}'", raw))?;
    let question_id = id
        .trim()
        .parse()
        .map_err(|_| format!("question id '{}' is not a number", id))?;
    Ok(FeedbackAnswer {
        question_id,
        answer: answer.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer() {
        let answer = parse_answer("3=Hyvä tehtävä=kiva").unwrap();
        assert_eq!(answer.question_id, 3);
        assert_eq!(answer.answer, "Hyvä tehtävä=kiva");

        assert!(parse_answer("no separator").is_err());
        assert!(parse_answer("x=5").is_err());
    }

    #[test]
    fn test_download_args_defaults() {
        let cli = Cli::try_parse_from(["tmc", "download", "21"]).unwrap();
        match cli.command {
            Commands::Download(args) => {
                assert_eq!(args.course_id, "21");
                assert_eq!(args.path, PathBuf::from("."));
            }
            _ => panic!("expected download command"),
        }
    }

    #[test]
    fn test_feedback_collects_answers() {
        let cli = Cli::try_parse_from([
            "tmc", "-vv", "feedback", "https://tmc.example.org/feedback", "-a", "1=5", "--answer", "2=ok",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Feedback(args) => assert_eq!(args.answers.len(), 2),
            _ => panic!("expected feedback command"),
        }
    }
}
