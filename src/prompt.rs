//! Prompt templates for the chat and exam-summary endpoints
//!
//! Templates only interpolate what the requester sent or what the records service
//! returned; nothing else about the student reaches the model.

use crate::records::{ExamFolder, SubjectResult};

/// Maximum number of script links embedded in an exam-summary prompt
pub const MAX_SCRIPT_LINKS: usize = 5;

const CHAT_INSTRUCTIONS: &str = "You are the college portal assistant. Answer the student's \
question clearly and concisely. If the question is about attendance, marks or exams and you \
do not have the data, tell the student where in the portal to find it instead of guessing.";

const EXAM_SUMMARY_INSTRUCTIONS: &str = "You are an academic assistant reviewing a student's \
exam performance. Using only the details below, write a short, encouraging summary: how the \
student did, what the score suggests about their preparation, and two or three concrete \
suggestions for improving in this subject. Do not invent marks or question-level details.";

/// Prompt for a free-form chat message
pub fn chat_prompt(message: &str, student_email: Option<&str>) -> String {
    let mut prompt = format!("{}\n\n", CHAT_INSTRUCTIONS);
    if let Some(email) = student_email.map(str::trim).filter(|e| !e.is_empty()) {
        prompt.push_str(&format!("Signed-in student: {}\n", email));
    }
    prompt.push_str(&format!("Student question: {}", message.trim()));
    prompt
}

/// Everything the exam-summary template needs
#[derive(Debug, Clone, Copy)]
pub struct ExamSummaryContext<'a> {
    pub roll_no: &'a str,
    pub folder: &'a ExamFolder,
    pub subject: &'a SubjectResult,
    /// Extra free text the student sent along with the request
    pub note: Option<&'a str>,
}

/// Prompt for an exam-summary request
pub fn exam_summary_prompt(ctx: &ExamSummaryContext<'_>) -> String {
    let mut prompt = format!("{}\n\n", EXAM_SUMMARY_INSTRUCTIONS);

    prompt.push_str(&format!("Roll number: {}\n", ctx.roll_no));
    prompt.push_str(&format!("Exam: {}\n", ctx.folder.exam_name));
    prompt.push_str(&format!("Subject: {}\n", ctx.subject.subject_name));
    prompt.push_str(&format!(
        "Marks: {} / {}\n",
        format_marks(ctx.subject.marks_obtained),
        format_marks(ctx.subject.max_marks)
    ));

    let links: Vec<&str> = ctx
        .subject
        .scripts
        .iter()
        .take(MAX_SCRIPT_LINKS)
        .map(|s| s.url.as_str())
        .collect();
    if links.is_empty() {
        prompt.push_str("Answer scripts: none uploaded\n");
    } else {
        prompt.push_str("Answer scripts:\n");
        for (i, url) in links.iter().enumerate() {
            prompt.push_str(&format!("{}. {}\n", i + 1, url));
        }
    }

    if let Some(note) = ctx.note.map(str::trim).filter(|n| !n.is_empty()) {
        prompt.push_str(&format!("\nStudent's request: {}\n", note));
    }

    prompt
}

/// Render a mark without a trailing `.0` for whole numbers
fn format_marks(value: Option<f64>) -> String {
    match value {
        Some(v) if v.fract() == 0.0 && v.is_finite() => format!("{}", v as i64),
        Some(v) => format!("{}", v),
        None => "N/A".to_string(),
    }
}
