//! Input checks run before any request leaves the client.
//!
//! Limits mirror what the board API accepts; a failure here never reaches
//! the network and never touches store state.

use std::sync::LazyLock;

use regex::Regex;

use crate::errors::ValidationError;
use crate::kanban::models::{
    CreateBoardInput, CreateColumnInput, CreateTaskInput, UpdateBoardInput, UpdateColumnInput,
    UpdateTaskInput,
};

pub const BOARD_NAME_MAX: usize = 50;
pub const BOARD_DESCRIPTION_MAX: usize = 200;
pub const COLUMN_NAME_MAX: usize = 50;
pub const TASK_TITLE_MAX: usize = 200;
pub const TASK_DESCRIPTION_MAX: usize = 5000;
pub const COMMENT_MAX: usize = 10_000;
pub const LABEL_NAME_MAX: usize = 50;

static HEX_COLOR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").unwrap());

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

fn required(
    field: &'static str,
    value: &str,
    max: usize,
    label: &str,
) -> Result<(), ValidationError> {
    let len = value.trim().chars().count();
    if len == 0 {
        return Err(ValidationError::new(field, format!("{} is required", label)));
    }
    at_most(field, value, max, label)
}

fn at_most(
    field: &'static str,
    value: &str,
    max: usize,
    label: &str,
) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::new(
            field,
            format!("{} cannot be longer than {} characters", label, max),
        ));
    }
    Ok(())
}

pub fn hex_color(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if !HEX_COLOR_REGEX.is_match(value) {
        return Err(ValidationError::new(field, "Color must be a valid hex code"));
    }
    Ok(())
}

pub fn board_create(input: &CreateBoardInput) -> Result<(), ValidationError> {
    required("name", &input.name, BOARD_NAME_MAX, "Board name")?;
    if let Some(description) = &input.description {
        at_most("description", description, BOARD_DESCRIPTION_MAX, "Description")?;
    }
    Ok(())
}

pub fn board_update(input: &UpdateBoardInput) -> Result<(), ValidationError> {
    if let Some(name) = &input.name {
        required("name", name, BOARD_NAME_MAX, "Board name")?;
    }
    if let Some(description) = &input.description {
        at_most("description", description, BOARD_DESCRIPTION_MAX, "Description")?;
    }
    Ok(())
}

fn column_limit(limit: Option<u32>) -> Result<(), ValidationError> {
    if limit == Some(0) {
        return Err(ValidationError::new("limit", "Limit must be at least 1"));
    }
    Ok(())
}

pub fn column_create(input: &CreateColumnInput) -> Result<(), ValidationError> {
    required("name", &input.name, COLUMN_NAME_MAX, "Column name")?;
    if let Some(color) = &input.color {
        hex_color("color", color)?;
    }
    column_limit(input.limit)
}

pub fn column_update(input: &UpdateColumnInput) -> Result<(), ValidationError> {
    if let Some(name) = &input.name {
        required("name", name, COLUMN_NAME_MAX, "Column name")?;
    }
    if let Some(color) = &input.color {
        hex_color("color", color)?;
    }
    column_limit(input.limit)
}

pub fn task_create(input: &CreateTaskInput) -> Result<(), ValidationError> {
    required("title", &input.title, TASK_TITLE_MAX, "Title")?;
    if let Some(description) = &input.description {
        at_most("description", description, TASK_DESCRIPTION_MAX, "Description")?;
    }
    for label in &input.labels {
        required("labels", label, LABEL_NAME_MAX, "Label name")?;
    }
    Ok(())
}

pub fn task_update(input: &UpdateTaskInput) -> Result<(), ValidationError> {
    if let Some(title) = &input.title {
        required("title", title, TASK_TITLE_MAX, "Title")?;
    }
    if let Some(description) = &input.description {
        at_most("description", description, TASK_DESCRIPTION_MAX, "Description")?;
    }
    for label in input.labels.iter().flatten() {
        required("labels", label, LABEL_NAME_MAX, "Label name")?;
    }
    Ok(())
}

/// A label definition: name plus display color.
pub fn label(name: &str, color: &str) -> Result<(), ValidationError> {
    required("name", name, LABEL_NAME_MAX, "Label name")?;
    hex_color("color", color)
}

pub fn comment(content: &str) -> Result<(), ValidationError> {
    required("content", content, COMMENT_MAX, "Comment")
}

pub fn member_email(email: &str) -> Result<(), ValidationError> {
    if !EMAIL_REGEX.is_match(email.trim()) {
        return Err(ValidationError::new("email", "Enter a valid email address"));
    }
    Ok(())
}
