use colored::*;
use crate::core::data::{Course, Exercise, Review, RunResult, RunStatus, SubmissionResult};
use crate::utils::format::{format_deadline, truncate_string};

pub struct OutputStyle;

impl OutputStyle {
    pub fn name(text: &str) -> ColoredString {
        text.bright_green()
    }

    pub fn id(text: &str) -> ColoredString {
        text.dimmed()
    }

    pub fn url(text: &str) -> ColoredString {
        text.bright_cyan().underline()
    }

    pub fn title(text: &str) -> ColoredString {
        text.bright_blue().bold()
    }

    pub fn label(text: &str) -> ColoredString {
        text.cyan()
    }

    pub fn success(text: &str) -> ColoredString {
        text.green()
    }

    pub fn error(text: &str) -> ColoredString {
        text.red()
    }

    pub fn warning(text: &str) -> ColoredString {
        text.yellow()
    }

    pub fn info(text: &str) -> ColoredString {
        text.blue()
    }

    pub fn muted(text: &str) -> ColoredString {
        text.dimmed()
    }

    pub fn header_separator() -> String {
        "═".repeat(50)
    }

    pub fn print_header(title: &str) {
        println!("{}", Self::title(title));
        println!("{}", Self::header_separator());
    }

    pub fn print_field_colored(label: &str, value: &str, color_fn: impl Fn(&str) -> ColoredString) {
        println!("{:>12}: {}", Self::label(label), color_fn(value));
    }

    pub fn print_courses(courses: &[Course]) {
        Self::print_header("📚 Courses");
        for course in courses {
            println!("{:>6}  {}", Self::id(&course.id.to_string()), Self::name(&course.name));
        }
    }

    pub fn print_exercises(title: &str, exercises: &[Exercise]) {
        Self::print_header(title);
        for exercise in exercises {
            let mark = if exercise.completed {
                Self::success("✔")
            } else {
                Self::muted("·")
            };
            println!(
                "{} {:<40} {}",
                mark,
                Self::name(&truncate_string(&exercise.name, 40)),
                Self::muted(&format_deadline(exercise.deadline.as_ref()))
            );
        }
    }

    pub fn print_reviews(reviews: &[Review]) {
        Self::print_header("📝 Unread reviews");
        for review in reviews {
            println!(
                "{}  {}",
                Self::name(&review.exercise_name),
                Self::url(&review.url)
            );
        }
    }

    pub fn print_submission(result: &SubmissionResult) {
        Self::print_header("📤 Submission");
        let status_fn = if result.all_tests_passed {
            Self::success
        } else {
            Self::warning
        };
        Self::print_field_colored("Status", &result.status, status_fn);
        if !result.points.is_empty() {
            Self::print_field_colored("Points", &result.points.join(", "), Self::info);
        }
        if let Some(error) = &result.error {
            Self::print_field_colored("Error", error, Self::error);
        }
        Self::print_field_colored("Details", &result.submission_url, Self::url);
    }

    pub fn print_run_result(result: &RunResult) {
        if !result.output.trim().is_empty() {
            println!("{}", result.output.trim_end());
        }
        match result.status {
            RunStatus::Passed => println!("✅ {}", Self::success("All tests passed")),
            RunStatus::TestsFailed => println!(
                "❌ {}",
                Self::error(&format!("Tests failed (exit code {})", result.exit_code))
            ),
            RunStatus::Error => println!("❌ {}", Self::error("Test run was interrupted")),
        }
    }
}

pub fn print_success(message: &str) {
    println!("✅ {}", OutputStyle::success(message));
}

pub fn print_warning(message: &str) {
    println!("⚠️  {}", OutputStyle::warning(message));
}

pub fn handle_empty_list(item_type: &str) {
    println!("{}", OutputStyle::muted(&format!("No {} found", item_type)));
}
