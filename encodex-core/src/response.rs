use serde::{Deserialize, Serialize};
use std::fmt;

/// A key event as the study sees it, decoupled from the windowing backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPress {
    Char(char),
    Other,
}

/// The two accepted answers during the stimulus window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseKey {
    One,
    Two,
}

impl ResponseKey {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '1' => Some(ResponseKey::One),
            '2' => Some(ResponseKey::Two),
            _ => None,
        }
    }

    pub fn from_key(key: KeyPress) -> Option<Self> {
        match key {
            KeyPress::Char(c) => Self::from_char(c),
            KeyPress::Other => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ResponseKey::One => "1",
            ResponseKey::Two => "2",
        }
    }

    pub fn category(&self) -> Category {
        Category::from_response(Some(self.label()))
    }
}

impl fmt::Display for ResponseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Indoor/outdoor judgement derived from the recorded response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "indoor")]
    Indoor,
    #[serde(rename = "outdoor")]
    Outdoor,
    #[serde(rename = "NA")]
    NotAvailable,
}

impl Category {
    /// "1" is indoor, "2" is outdoor, anything else (including no answer) is NA.
    pub fn from_response(response: Option<&str>) -> Self {
        match response {
            Some("1") => Category::Indoor,
            Some("2") => Category::Outdoor,
            _ => Category::NotAvailable,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Indoor => "indoor",
            Category::Outdoor => "outdoor",
            Category::NotAvailable => "NA",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_follows_response() {
        assert_eq!(Category::from_response(Some("1")), Category::Indoor);
        assert_eq!(Category::from_response(Some("2")), Category::Outdoor);
        assert_eq!(Category::from_response(None), Category::NotAvailable);
        assert_eq!(Category::from_response(Some("3")), Category::NotAvailable);
        assert_eq!(Category::from_response(Some("")), Category::NotAvailable);
    }

    #[test]
    fn only_one_and_two_are_responses() {
        assert_eq!(ResponseKey::from_char('1'), Some(ResponseKey::One));
        assert_eq!(ResponseKey::from_char('2'), Some(ResponseKey::Two));
        assert_eq!(ResponseKey::from_char('q'), None);
        assert_eq!(ResponseKey::from_key(KeyPress::Other), None);
        assert_eq!(ResponseKey::Two.category(), Category::Outdoor);
    }

    #[test]
    fn category_labels() {
        assert_eq!(Category::NotAvailable.to_string(), "NA");
        assert_eq!(Category::Indoor.to_string(), "indoor");
    }
}
