// Exercise operations - Submit, Test, Paste, Feedback

use anyhow::{Result, anyhow};

use crate::cli::{FeedbackArgs, PathArgs};
use crate::manager::Session;
use crate::utils::{OutputStyle, print_success, print_warning};

pub async fn handle_submit(session: &mut Session, args: &PathArgs) -> Result<()> {
    println!("{}", OutputStyle::info("📤 Submitting, waiting for results..."));
    let result = session.core.submit(&args.path)?.await?;
    OutputStyle::print_submission(&result);
    Ok(())
}

pub async fn handle_test(session: &mut Session, args: &PathArgs) -> Result<()> {
    let result = session.core.test(&args.path)?.await?;
    OutputStyle::print_run_result(&result);
    Ok(())
}

pub async fn handle_paste(session: &mut Session, args: &PathArgs) -> Result<()> {
    let url = session.core.paste(&args.path)?.await?;
    println!("📋 Paste created: {}", OutputStyle::url(&url));
    Ok(())
}

pub async fn handle_feedback(session: &mut Session, args: FeedbackArgs) -> Result<()> {
    if args.answers.is_empty() {
        return Err(anyhow!("No answers given. Use --answer QUESTION_ID=TEXT."));
    }
    let count = args.answers.len();
    if session.core.send_feedback(args.answers, &args.url)?.await? {
        print_success(&format!("Sent {} answer(s)", count));
    } else {
        print_warning("The server did not accept the feedback");
    }
    Ok(())
}
