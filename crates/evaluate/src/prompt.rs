use crate::schema::{ChatMessage, ConfigurationBundle};

pub const RUBRIC_LABEL: &str = "Rubric:";
pub const EXAMPLE_SUBMISSION_LABEL: &str = "Example submission:";
pub const EXAMPLE_EVALUATION_LABEL: &str = "Example evaluation:";
pub const SUBMISSION_LABEL: &str = "Submission:";

/// Build the two-message evaluation prompt: the stored instruction as the
/// system message, then rubric, worked example and the new submission.
pub fn build_messages(bundle: &ConfigurationBundle, submission: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(bundle.instruction.clone()),
        ChatMessage::user(build_user_prompt(bundle, submission)),
    ]
}

pub fn build_user_prompt(bundle: &ConfigurationBundle, submission: &str) -> String {
    format!(
        r#"{RUBRIC_LABEL}
{}

{EXAMPLE_SUBMISSION_LABEL}
{}

{EXAMPLE_EVALUATION_LABEL}
{}

Now evaluate the following submission using the same format.
{SUBMISSION_LABEL}
{}
"#,
        bundle.rubric, bundle.example_submission, bundle.example_evaluation, submission
    )
}
