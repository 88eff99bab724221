use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Opaque session context exchanged with the concept conversation endpoint.
pub type ConversationState = Map<String, Value>;

/// Lightweight record returned by the project listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectSummary {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub last_edited: String,
    #[serde(default)]
    pub completed_chapters: u32,
    #[serde(default)]
    pub total_chapters: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: String,
    #[serde(default)]
    pub user_id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub initial_prompt: String,
    #[serde(default)]
    pub conversation_history: Vec<Map<String, Value>>,
    #[serde(default)]
    pub blueprint: Option<Blueprint>,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

impl Project {
    pub fn summary(&self) -> ProjectSummary {
        let genre = self
            .blueprint
            .as_ref()
            .map(|blueprint| blueprint.genre.clone())
            .unwrap_or_default();
        let completed = self
            .chapters
            .iter()
            .filter(|chapter| chapter.generation_status == ChapterGenerationStatus::Successful)
            .count();
        ProjectSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            genre,
            last_edited: String::new(),
            completed_chapters: completed as u32,
            total_chapters: self.chapters.len() as u32,
        }
    }
}

/// Structured planning document for a project's content.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Blueprint {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub target_audience: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub tone: String,
    #[serde(default)]
    pub one_sentence_summary: String,
    #[serde(default)]
    pub full_synopsis: String,
    #[serde(default)]
    pub world_setting: Map<String, Value>,
    #[serde(default)]
    pub characters: Vec<Map<String, Value>>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub chapter_outline: Vec<ChapterOutline>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Relationship {
    pub character_from: String,
    pub character_to: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChapterOutline {
    pub chapter_number: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChapterGenerationStatus {
    #[default]
    NotGenerated,
    Generating,
    Evaluating,
    Selecting,
    Failed,
    EvaluationFailed,
    WaitingForConfirm,
    Successful,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Chapter {
    pub chapter_number: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub real_summary: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub versions: Option<Vec<String>>,
    #[serde(default)]
    pub evaluation: Option<String>,
    #[serde(default)]
    pub generation_status: ChapterGenerationStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChoiceOption {
    pub id: String,
    pub label: String,
}

/// Which widget the front end should render for the next answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UiControl {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub options: Option<Vec<ChoiceOption>>,
    #[serde(default)]
    pub placeholder: Option<String>,
}

impl UiControl {
    pub fn is_single_choice(&self) -> bool {
        self.kind == "single_choice"
    }

    pub fn choices(&self) -> &[ChoiceOption] {
        self.options.as_deref().unwrap_or(&[])
    }
}

impl Default for UiControl {
    fn default() -> Self {
        Self {
            kind: "text_input".to_string(),
            options: None,
            placeholder: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConverseResponse {
    pub ai_message: String,
    #[serde(default)]
    pub ui_control: UiControl,
    #[serde(default)]
    pub conversation_state: ConversationState,
    #[serde(default)]
    pub is_complete: bool,
    #[serde(default)]
    pub ready_for_blueprint: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BlueprintGenerationResponse {
    pub blueprint: Blueprint,
    #[serde(default)]
    pub ai_message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PoemVersion {
    /// Zero when the service left the number out or sent something that is
    /// not a number.
    #[serde(default, deserialize_with = "lenient_number")]
    pub version_number: u32,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PoemGenerationResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub versions: Vec<PoemVersion>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteProjectsResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// Generated versions come straight from model output, so the number may be
/// missing, quoted, or a float.
fn lenient_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let number = match value {
        Some(Value::Number(number)) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|n| *n >= 0.0).map(|n| n as u64)),
        Some(Value::String(text)) => text.trim().parse::<u64>().ok(),
        _ => None,
    };
    Ok(number
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or_default())
}

/// The answer sent to the concept conversation. A missing answer is sent as
/// `{"id": null, "value": null}`.
pub fn user_input_or_empty(input: Option<Value>) -> Value {
    match input {
        Some(value) if !value.is_null() => value,
        _ => serde_json::json!({ "id": null, "value": null }),
    }
}
