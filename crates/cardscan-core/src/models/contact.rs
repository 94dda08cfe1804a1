use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use utoipa::ToSchema;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// One target field of the extraction contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionField {
    pub name: &'static str,
    pub description: &'static str,
}

/// Fields the LLM is asked to fill, in the order they appear in the response schema.
pub const EXTRACTION_SCHEMA: [ExtractionField; 7] = [
    ExtractionField {
        name: "Name",
        description: "The person's full name.",
    },
    ExtractionField {
        name: "Designation",
        description: "The job title or role.",
    },
    ExtractionField {
        name: "Company",
        description: "The company name.",
    },
    ExtractionField {
        name: "Phone",
        description: "The primary phone number, standardized to include country code.",
    },
    ExtractionField {
        name: "Email",
        description: "The primary email address.",
    },
    ExtractionField {
        name: "Website",
        description: "The company's website URL.",
    },
    ExtractionField {
        name: "Address",
        description: "The full office address (combine multiple lines).",
    },
];

/// CSV column order.
pub const EXPORT_COLUMNS: [&str; 7] = [
    "Name",
    "Designation",
    "Company",
    "Phone",
    "Email",
    "Address",
    "Website",
];

/// Structured contact extracted from one card.
///
/// The shape is fixed: every business field is present even when empty, so a
/// failed extraction and a successful one serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ContactRecord {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Designation", default)]
    pub designation: String,
    #[serde(rename = "Company", default)]
    pub company: String,
    #[serde(rename = "Phone", default)]
    pub phone: String,
    #[serde(rename = "Email", default)]
    pub email: String,
    #[serde(rename = "Address", default)]
    pub address: String,
    #[serde(rename = "Website", default)]
    pub website: String,
    /// Whitespace-collapsed OCR text the record was built from.
    #[serde(rename = "Raw_Text", default)]
    pub raw_text: String,
}

impl ContactRecord {
    /// The all-empty record carrying only the normalized raw text.
    pub fn fallback(raw_text: &str) -> Self {
        Self {
            raw_text: normalize_whitespace(raw_text),
            ..Self::default()
        }
    }

    pub fn with_raw_text(mut self, raw_text: &str) -> Self {
        self.raw_text = normalize_whitespace(raw_text);
        self
    }

    /// Look up a business field by its column name.
    pub fn field(&self, column: &str) -> Option<&str> {
        let value = match column {
            "Name" => &self.name,
            "Designation" => &self.designation,
            "Company" => &self.company,
            "Phone" => &self.phone,
            "Email" => &self.email,
            "Address" => &self.address,
            "Website" => &self.website,
            _ => return None,
        };
        Some(value.as_str())
    }

    /// True when none of the seven business fields carry a value.
    pub fn is_blank(&self) -> bool {
        EXPORT_COLUMNS
            .iter()
            .all(|column| self.field(column).map_or(true, str::is_empty))
    }
}

/// Collapse every whitespace run to a single space and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}
