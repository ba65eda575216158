use core::{fmt::Display, str::FromStr};

use chrono::NaiveDateTime;
use serde_json::Value;
use strum::{EnumCount, EnumIter};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, EnumCount, EnumIter)]
pub enum Category {
    Pass = 0,
    Blocked = 1,
    Other = 2,
}

#[derive(Debug, PartialEq)]
pub struct ParseCategoryError;

impl Category {
    pub fn index(self) -> usize {
        self as usize
    }

    /// Classifies the `event` member of a firewall record.
    ///
    /// The firewall serializes a pass as the bare string `"pass"` and a block
    /// as an object carrying a `blocked` member. Only those two shapes are
    /// recognised: anything else, including the string `"blocked"`, lands in
    /// `Other`. The upstream shape alone decides the category.
    pub fn classify(event: &Value) -> Self {
        match event {
            Value::String(s) if s == "pass" => Category::Pass,
            Value::Object(map) if map.get("blocked").is_some_and(is_truthy) => Category::Blocked,
            _ => Category::Other,
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Category::Pass => write!(f, "Pass"),
            Category::Blocked => write!(f, "Blocked"),
            Category::Other => write!(f, "Other"),
        }
    }
}

impl FromStr for Category {
    type Err = ParseCategoryError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pass" | "pass" => Ok(Self::Pass),
            "Blocked" | "blocked" => Ok(Self::Blocked),
            "Other" | "other" => Ok(Self::Other),
            _ => Err(ParseCategoryError),
        }
    }
}

/// A single firewall decision. Immutable once ingested.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub timestamp: NaiveDateTime,
    pub category: Category,
}

impl EventRecord {
    pub fn new(timestamp: NaiveDateTime, category: Category) -> Self {
        Self {
            timestamp,
            category,
        }
    }
}
