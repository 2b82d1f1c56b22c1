//! Content-table allow-list and per-table schema registry.
//!
//! Every table the engines may mutate is a variant of [`ContentTable`].
//! Free-form table names only enter the system through
//! [`ContentTable::from_str`], which rejects anything outside the list with
//! [`CoreError::ForbiddenTable`].

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Record;

/// Field names written through plans must be plain snake_case identifiers.
pub const FIELD_NAME_PATTERN: &str = r"^[a-z_][a-z0-9_]*$";

static FIELD_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(FIELD_NAME_PATTERN).expect("valid regex"));

/// Maximum length of a field name (PostgreSQL identifier limit).
pub const MAX_FIELD_NAME_LENGTH: usize = 63;

/// Column holding the primary key in every content table.
pub const ID_FIELD: &str = "id";

/// Required-field and status-field metadata for one content table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    pub required_fields: &'static [&'static str],
    pub status_field: Option<&'static str>,
}

impl TableSchema {
    /// Required fields that are absent or blank in `data`.
    pub fn missing_fields(&self, data: &Record) -> Vec<&'static str> {
        self.required_fields
            .iter()
            .copied()
            .filter(|field| data.get(*field).map_or(true, is_blank))
            .collect()
    }
}

/// `null`, whitespace-only strings and empty arrays count as absent.
fn is_blank(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::String(s) => s.trim().is_empty(),
        serde_json::Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

macro_rules! define_content_tables {
    (
        $(
            $variant:ident => $name:literal {
                required: [$($field:literal),* $(,)?],
                status: $status:expr $(,)?
            }
        ),+ $(,)?
    ) => {
        /// The closed set of content tables plans may touch.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum ContentTable {
            $( $variant ),+
        }

        impl ContentTable {
            /// Every allow-listed table, in declaration order.
            pub const ALL: &'static [ContentTable] = &[ $( ContentTable::$variant ),+ ];

            /// The SQL table name.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( ContentTable::$variant => $name ),+
                }
            }

            /// Static schema entry for this table.
            pub fn schema(self) -> TableSchema {
                match self {
                    $(
                        ContentTable::$variant => TableSchema {
                            required_fields: &[$($field),*],
                            status_field: $status,
                        }
                    ),+
                }
            }
        }

        impl FromStr for ContentTable {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $name => Ok(ContentTable::$variant), )+
                    other => Err(CoreError::ForbiddenTable(other.to_string())),
                }
            }
        }
    };
}

define_content_tables! {
    Articles => "articles" { required: ["title", "slug", "category"], status: Some("published") },
    Projects => "projects" { required: ["title", "description"], status: Some("status") },
    Updates => "updates" { required: ["title", "content"], status: Some("published") },
    Artwork => "artwork" { required: ["title", "image_url"], status: Some("published") },
    Experiments => "experiments" { required: ["title", "description"], status: Some("status") },
    Favorites => "favorites" { required: ["title", "category"], status: None },
    Inspirations => "inspirations" { required: ["title"], status: None },
    Experiences => "experiences" { required: ["company", "role", "start_date"], status: None },
    Certifications => "certifications" { required: ["name", "issuer"], status: None },
    ClientProjects => "client_projects" { required: ["client_name", "title"], status: Some("status") },
    Skills => "skills" { required: ["name", "category"], status: None },
    Products => "products" { required: ["name", "slug"], status: Some("status") },
    ProductReviews => "product_reviews" { required: ["product_id", "title", "rating"], status: Some("published") },
    LifePeriods => "life_periods" { required: ["title", "start_date"], status: None },
    LearningGoals => "learning_goals" { required: ["title"], status: Some("status") },
    FundingCampaigns => "funding_campaigns" { required: ["title", "goal_amount"], status: Some("status") },
    Supplies => "supplies" { required: ["name", "category"], status: None },
}

impl fmt::Display for ContentTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validate that a field name is a safe snake_case identifier.
pub fn validate_field_name(name: &str) -> Result<(), CoreError> {
    if name.len() > MAX_FIELD_NAME_LENGTH || !FIELD_NAME_RE.is_match(name) {
        return Err(CoreError::Validation(format!(
            "Invalid field name '{name}': must match {FIELD_NAME_PATTERN} and be at most \
             {MAX_FIELD_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate every field name in `data` and reject attempts to set the id.
pub fn validate_fields(data: &Record) -> Result<(), CoreError> {
    for name in data.keys() {
        validate_field_name(name)?;
        if name == ID_FIELD {
            return Err(CoreError::Validation(
                "The 'id' field is assigned by the store and cannot be written".to_string(),
            ));
        }
    }
    Ok(())
}

/// Copy of `record` without its primary key, used when writing a snapshot back.
pub fn without_id(record: &Record) -> Record {
    record
        .iter()
        .filter(|(name, _)| name.as_str() != ID_FIELD)
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}
