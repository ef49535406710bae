// Course operations - Listing, Download, Updates, Reviews

use anyhow::{Result, anyhow};

use crate::cli::{CourseArgs, DownloadArgs, PathArgs};
use crate::core::data::Course;
use crate::manager::Session;
use crate::utils::{OutputStyle, handle_empty_list, print_success};

pub async fn handle_courses(session: &mut Session) -> Result<()> {
    let courses = session.core.list_courses()?.await?;
    if courses.is_empty() {
        handle_empty_list("courses");
        return Ok(());
    }
    OutputStyle::print_courses(&courses);
    Ok(())
}

pub async fn handle_exercises(session: &mut Session, args: &PathArgs) -> Result<()> {
    let exercises = session.core.list_exercises(&args.path)?.await?;
    OutputStyle::print_exercises("📋 Exercises", &exercises);
    Ok(())
}

pub async fn handle_download(session: &mut Session, args: &DownloadArgs) -> Result<()> {
    let downloaded = session
        .core
        .download_exercises(&args.path, &args.course_id)?
        .await?;
    if downloaded.is_empty() {
        println!("{}", OutputStyle::muted("All exercises are already downloaded"));
        return Ok(());
    }
    OutputStyle::print_exercises("⬇️  Downloaded", &downloaded);
    print_success(&format!("Downloaded {} exercise(s)", downloaded.len()));
    Ok(())
}

pub async fn handle_updates(session: &mut Session, args: &CourseArgs) -> Result<()> {
    let course = find_course(session, &args.course).await?;
    let updated = session.core.get_new_and_updated_exercises(&course)?.await?;
    if updated.is_empty() {
        println!("{}", OutputStyle::muted(&format!("{} is up to date", course.name)));
        return Ok(());
    }
    OutputStyle::print_exercises("🆕 New and updated exercises", &updated);
    Ok(())
}

pub async fn handle_reviews(session: &mut Session, args: &CourseArgs) -> Result<()> {
    let course = find_course(session, &args.course).await?;
    let reviews = session.core.get_new_reviews(&course)?.await?;
    if reviews.is_empty() {
        handle_empty_list("unread reviews");
        return Ok(());
    }
    OutputStyle::print_reviews(&reviews);
    Ok(())
}

/// Look a course up by numeric ID or exact name
async fn find_course(session: &Session, key: &str) -> Result<Course> {
    let courses = session.core.list_courses()?.await?;
    courses
        .into_iter()
        .find(|course| course.id.to_string() == key || course.name == key)
        .ok_or_else(|| anyhow!("No course matching '{}'", key))
}
