//! Common types and utilities shared across models.

use serde::{Deserialize, Deserializer, Serialize};
use sqlx::{Encode, QueryBuilder, Sqlite, Type};

/// Defines a closed set of text values stored as TEXT columns.
///
/// The same wire string is used by serde, sqlx and `FromStr`, so a value
/// validated once at the HTTP boundary round-trips unchanged through storage.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                #[sqlx(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let lowered = s.trim().to_lowercase();
                $(
                    if lowered == $text {
                        return Ok($name::$variant);
                    }
                )+
                let allowed: Vec<&str> = $name::ALL.iter().map(|v| v.as_str()).collect();
                Err(format!("Unknown value '{}', expected one of: {}", s, allowed.join(", ")))
            }
        }
    };
}

text_enum! {
    pub enum Gender {
        Male => "male",
        Female => "female",
        Other => "other",
    }
}

text_enum! {
    pub enum MaritalStatus {
        Single => "single",
        Married => "married",
        Divorced => "divorced",
        Widowed => "widowed",
    }
}

text_enum! {
    pub enum EmploymentType {
        FullTime => "full-time",
        PartTime => "part-time",
        Contract => "contract",
        Intern => "intern",
    }
}

text_enum! {
    pub enum WorkType {
        Office => "office",
        Remote => "remote",
        Hybrid => "hybrid",
    }
}

text_enum! {
    /// Employment status; new employees start out `active`.
    pub enum EmployeeStatus {
        Active => "active",
        OnLeave => "on_leave",
        Resigned => "resigned",
        Terminated => "terminated",
    }
}

impl Default for EmployeeStatus {
    fn default() -> Self {
        EmployeeStatus::Active
    }
}

/// Pagination window applied to list and search queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    pub skip: i64,
    pub limit: i64,
}

impl Page {
    pub const DEFAULT_LIMIT: i64 = 100;

    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// Current time in the format stored in `created_at`/`updated_at` columns
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Lowercased form kept in the `*_lower` search columns.
///
/// Search terms go through the same function, so matching never depends on
/// SQLite's ASCII-only `LOWER()`.
pub fn search_text(text: &str) -> String {
    text.to_lowercase()
}

/// Build a `LIKE` pattern matching `needle` as a literal, case-insensitive substring.
///
/// Pair with `ESCAPE '\'` and a `*_lower` column operand.
pub fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in search_text(needle).chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Deserialize a nullable field of a partial update.
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`:
/// absent gives `None`, `null` gives `Some(None)` and a value `Some(Some(v))`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// `UPDATE <table> SET ...` assigning only the columns a request supplied.
///
/// `updated_at` is always assigned, so the statement is never empty.
pub struct PartialUpdate<'args> {
    qb: QueryBuilder<'args, Sqlite>,
}

impl<'args> PartialUpdate<'args> {
    pub fn new(table: &str, updated_at: String) -> Self {
        let mut qb = QueryBuilder::new(format!("UPDATE {} SET updated_at = ", table));
        qb.push_bind(updated_at);
        Self { qb }
    }

    pub fn set<T>(&mut self, column: &str, value: T) -> &mut Self
    where
        T: 'args + Encode<'args, Sqlite> + Type<Sqlite> + Send,
    {
        self.qb.push(", ").push(column).push(" = ").push_bind(value);
        self
    }

    /// Assign `column` only when the request carried a value for it
    pub fn set_some<T>(&mut self, column: &str, value: Option<T>) -> &mut Self
    where
        T: 'args + Encode<'args, Sqlite> + Type<Sqlite> + Send,
    {
        if let Some(value) = value {
            self.set(column, value);
        }
        self
    }

    /// Finish with `WHERE id = ? RETURNING *`
    pub fn returning(mut self, id: i64) -> QueryBuilder<'args, Sqlite> {
        self.qb.push(" WHERE id = ").push_bind(id).push(" RETURNING *");
        self.qb
    }
}
