use serde::{Deserialize, Serialize};

use super::is_blank;
use crate::error::FieldError;
use crate::store::{Meta, Model};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    #[serde(flatten)]
    pub meta: Meta,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl Model for Announcement {
    const COLLECTION: &'static str = "announcements";
    const LABEL: &'static str = "Announcement";

    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }

    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if is_blank(&self.author) {
            errors.push(FieldError::new("author", "Author is required"));
        }
        if is_blank(&self.title) {
            errors.push(FieldError::new("title", "Title is required"));
        }
        if is_blank(&self.content) {
            errors.push(FieldError::new("content", "Content is required"));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
