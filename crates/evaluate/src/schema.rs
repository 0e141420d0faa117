use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// The four stored artifacts that parameterize every evaluation.
/// Absent artifacts are represented by empty strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigurationBundle {
    pub rubric: String,
    pub example_submission: String,
    pub example_evaluation: String,
    pub instruction: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BundleField {
    Rubric,
    ExampleSubmission,
    ExampleEvaluation,
    Instruction,
}

impl BundleField {
    pub const ALL: [BundleField; 4] = [
        BundleField::Rubric,
        BundleField::ExampleSubmission,
        BundleField::ExampleEvaluation,
        BundleField::Instruction,
    ];

    /// Name of the backing artifact inside the config directory
    pub fn file_name(self) -> &'static str {
        match self {
            BundleField::Rubric => "rubric.docx",
            BundleField::ExampleSubmission => "example_submission.docx",
            BundleField::ExampleEvaluation => "example_evaluation.docx",
            BundleField::Instruction => "instruction.txt",
        }
    }

    /// Multipart form field name
    pub fn form_name(self) -> &'static str {
        match self {
            BundleField::Rubric => "rubric",
            BundleField::ExampleSubmission => "example_submission",
            BundleField::ExampleEvaluation => "example_evaluation",
            BundleField::Instruction => "instruction",
        }
    }

    pub fn from_form_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.form_name() == name)
    }

    pub fn label(self) -> &'static str {
        match self {
            BundleField::Rubric => "Rubric",
            BundleField::ExampleSubmission => "Example submission",
            BundleField::ExampleEvaluation => "Example evaluation",
            BundleField::Instruction => "Instruction",
        }
    }

    pub fn is_document(self) -> bool {
        !matches!(self, BundleField::Instruction)
    }
}

impl std::fmt::Display for BundleField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.form_name())
    }
}

/// Partial replacement of the stored bundle. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct BundleUpdate {
    pub rubric: Option<Vec<u8>>,
    pub example_submission: Option<Vec<u8>>,
    pub example_evaluation: Option<Vec<u8>>,
    pub instruction: Option<String>,
}

impl BundleUpdate {
    pub fn is_empty(&self) -> bool {
        self.rubric.is_none()
            && self.example_submission.is_none()
            && self.example_evaluation.is_none()
            && self.instruction.is_none()
    }

    /// Set one field from uploaded bytes; the instruction is decoded as UTF-8.
    pub fn set(&mut self, field: BundleField, bytes: Vec<u8>) {
        match field {
            BundleField::Rubric => self.rubric = Some(bytes),
            BundleField::ExampleSubmission => self.example_submission = Some(bytes),
            BundleField::ExampleEvaluation => self.example_evaluation = Some(bytes),
            BundleField::Instruction => {
                self.instruction = Some(String::from_utf8_lossy(&bytes).into_owned())
            }
        }
    }

    /// Fields in write order, paired with the bytes to store
    pub fn entries(&self) -> Vec<(BundleField, &[u8])> {
        let mut out = Vec::new();
        if let Some(b) = &self.rubric {
            out.push((BundleField::Rubric, b.as_slice()));
        }
        if let Some(b) = &self.example_submission {
            out.push((BundleField::ExampleSubmission, b.as_slice()));
        }
        if let Some(b) = &self.example_evaluation {
            out.push((BundleField::ExampleEvaluation, b.as_slice()));
        }
        if let Some(s) = &self.instruction {
            out.push((BundleField::Instruction, s.as_bytes()));
        }
        out
    }
}
