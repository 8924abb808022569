use crate::error::{Result, SplitError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

// Leading page number, followed by whitespace or the end of the reference.
static PAGE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)(?:\s|$)").unwrap());

/// A top-level outline entry: its title and a viewer destination such as
/// `"11 XYZ null null null"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bookmark {
    pub title: String,
    pub page_reference: String,
}

impl Bookmark {
    pub fn new(title: impl Into<String>, page_reference: impl Into<String>) -> Self {
        Bookmark {
            title: title.into(),
            page_reference: page_reference.into(),
        }
    }

    /// The 1-based page this bookmark points at.
    pub fn start_page(&self) -> Result<u32> {
        parse_page_number(&self.page_reference).ok_or_else(|| SplitError::MalformedBookmark {
            title: self.title.clone(),
            reference: self.page_reference.clone(),
        })
    }
}

/// Parse the leading page number of a destination string. Page 0 does not
/// exist in a 1-based numbering, so it is rejected like any other garbage.
pub fn parse_page_number(reference: &str) -> Option<u32> {
    let caps = PAGE_NUMBER.captures(reference)?;
    match caps[1].parse::<u32>() {
        Ok(0) | Err(_) => None,
        Ok(n) => Some(n),
    }
}
