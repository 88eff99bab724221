use serde_json::{json, Value};
use std::fmt::Write as _;
use verso_core::model::{
    Blueprint, ConverseResponse, PoemVersion, Project, ProjectSummary, UiControl,
};

pub fn render_project_list(projects: &[ProjectSummary]) -> String {
    if projects.is_empty() {
        return "No poem projects yet.\n".to_string();
    }
    let id_width = projects.iter().map(|p| p.id.len()).max().unwrap_or(0);
    let mut out = String::new();
    for project in projects {
        let edited = if project.last_edited.is_empty() {
            "-"
        } else {
            project.last_edited.as_str()
        };
        let _ = writeln!(
            out,
            "{:<id_width$}  {}  ({edited})",
            project.id,
            display_title(&project.title),
        );
    }
    let _ = writeln!(out, "{} project(s)", projects.len());
    out
}

pub fn render_project(project: &Project) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} [{}]", display_title(&project.title), project.id);
    if !project.initial_prompt.is_empty() {
        let _ = writeln!(out, "prompt: {}", project.initial_prompt);
    }
    let _ = writeln!(
        out,
        "conversation turns: {}",
        project.conversation_history.len()
    );
    match &project.blueprint {
        Some(blueprint) => out.push_str(&render_blueprint(blueprint)),
        None => out.push_str("no blueprint yet\n"),
    }
    out
}

pub fn render_blueprint(blueprint: &Blueprint) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "blueprint: {}", display_title(&blueprint.title));
    let fields = [
        ("genre", &blueprint.genre),
        ("style", &blueprint.style),
        ("tone", &blueprint.tone),
        ("audience", &blueprint.target_audience),
        ("summary", &blueprint.one_sentence_summary),
        ("synopsis", &blueprint.full_synopsis),
    ];
    for (label, value) in fields {
        if !value.is_empty() {
            let _ = writeln!(out, "  {label}: {value}");
        }
    }
    for outline in &blueprint.chapter_outline {
        let _ = writeln!(
            out,
            "  {}. {}: {}",
            outline.chapter_number, outline.title, outline.summary
        );
    }
    out
}

pub fn render_reply(reply: &ConverseResponse) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", reply.ai_message.trim_end());
    for (index, option) in reply.ui_control.choices().iter().enumerate() {
        let _ = writeln!(out, "  [{}] {}", index + 1, option.label);
    }
    if let Some(placeholder) = &reply.ui_control.placeholder {
        let _ = writeln!(out, "  ({placeholder})");
    }
    if reply.is_complete {
        out.push_str("Concept complete. Run `verso blueprint generate` next.\n");
    }
    out
}

pub fn render_versions(versions: &[PoemVersion]) -> String {
    let mut out = String::new();
    for (index, version) in versions.iter().enumerate() {
        let number = match version.version_number {
            0 => index as u32 + 1,
            n => n,
        };
        let _ = writeln!(
            out,
            "--- version {number}: {}",
            display_title(&version.title)
        );
        let _ = writeln!(out, "{}", version.content.trim_end());
        if !version.notes.is_empty() {
            let _ = writeln!(out, "notes: {}", version.notes);
        }
    }
    out
}

/// Turns a line typed at the prompt into the `user_input` payload. A number
/// picks the matching option of a choice control; anything else is free text.
pub fn parse_answer(line: &str, control: &UiControl) -> Value {
    let answer = line.trim();
    if let Ok(index) = answer.parse::<usize>() {
        if let Some(option) = index
            .checked_sub(1)
            .and_then(|index| control.choices().get(index))
        {
            return json!({ "id": option.id, "value": option.label });
        }
    }
    if let Some(option) = control
        .choices()
        .iter()
        .find(|option| option.id == answer || option.label == answer)
    {
        return json!({ "id": option.id, "value": option.label });
    }
    json!({ "id": null, "value": answer })
}

fn display_title(title: &str) -> &str {
    if title.trim().is_empty() {
        "(untitled)"
    } else {
        title
    }
}
