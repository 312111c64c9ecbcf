//! Query & filter engine for employee, department and position searches.
//!
//! Raw query-string parameters (`*Params`) are validated once into typed
//! filters, which then render themselves into a `QueryBuilder` predicate.
//! All filter categories are AND-combined; multi-valued categories are
//! OR-combined internally through `IN (...)`. Ordering always ends with
//! `id ASC` so identical queries page identically.

use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite};
use std::collections::HashMap;
use std::str::FromStr;

use super::models::{contains_pattern, EmployeeStatus, EmploymentType, Page, WorkType};
use crate::config::SearchConfig;

/// Field-level problems found while validating query parameters
#[derive(Debug, Default)]
pub struct InvalidParams {
    pub errors: HashMap<String, Vec<String>>,
}

impl InvalidParams {
    fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    fn finish<T>(self, value: T) -> Result<T, InvalidParams> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

/// Sortable employee attributes.
///
/// Only these names are accepted for `sort_by`; anything else is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmployeeSortField {
    Id,
    FirstName,
    #[default]
    LastName,
    Email,
    Phone,
    City,
    DateOfBirth,
    JoinDate,
    EmploymentType,
    WorkType,
    Status,
    Ctc,
    MonthlySalary,
    DepartmentId,
    PositionId,
    CreatedAt,
    UpdatedAt,
}

impl EmployeeSortField {
    pub const ALL: &'static [EmployeeSortField] = &[
        EmployeeSortField::Id,
        EmployeeSortField::FirstName,
        EmployeeSortField::LastName,
        EmployeeSortField::Email,
        EmployeeSortField::Phone,
        EmployeeSortField::City,
        EmployeeSortField::DateOfBirth,
        EmployeeSortField::JoinDate,
        EmployeeSortField::EmploymentType,
        EmployeeSortField::WorkType,
        EmployeeSortField::Status,
        EmployeeSortField::Ctc,
        EmployeeSortField::MonthlySalary,
        EmployeeSortField::DepartmentId,
        EmployeeSortField::PositionId,
        EmployeeSortField::CreatedAt,
        EmployeeSortField::UpdatedAt,
    ];

    /// Column name; also the accepted `sort_by` spelling.
    pub fn column(&self) -> &'static str {
        match self {
            EmployeeSortField::Id => "id",
            EmployeeSortField::FirstName => "first_name",
            EmployeeSortField::LastName => "last_name",
            EmployeeSortField::Email => "email",
            EmployeeSortField::Phone => "phone",
            EmployeeSortField::City => "city",
            EmployeeSortField::DateOfBirth => "date_of_birth",
            EmployeeSortField::JoinDate => "join_date",
            EmployeeSortField::EmploymentType => "employment_type",
            EmployeeSortField::WorkType => "work_type",
            EmployeeSortField::Status => "status",
            EmployeeSortField::Ctc => "ctc",
            EmployeeSortField::MonthlySalary => "monthly_salary",
            EmployeeSortField::DepartmentId => "department_id",
            EmployeeSortField::PositionId => "position_id",
            EmployeeSortField::CreatedAt => "created_at",
            EmployeeSortField::UpdatedAt => "updated_at",
        }
    }
}

impl FromStr for EmployeeSortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        EmployeeSortField::ALL
            .iter()
            .copied()
            .find(|field| field.column() == wanted)
            .ok_or_else(|| {
                let allowed: Vec<&str> = EmployeeSortField::ALL.iter().map(|f| f.column()).collect();
                format!(
                    "Cannot sort by '{}', expected one of: {}",
                    s,
                    allowed.join(", ")
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn from_desc_flag(desc: bool) -> Self {
        if desc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Pagination parameters as they arrive on the query string
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    pub fn resolve(&self, limits: &SearchConfig) -> Result<Page, InvalidParams> {
        let mut invalid = InvalidParams::default();
        let page = resolve_page(self.skip, self.limit, limits, &mut invalid);
        invalid.finish(page)
    }
}

fn resolve_page(
    skip: Option<i64>,
    limit: Option<i64>,
    limits: &SearchConfig,
    invalid: &mut InvalidParams,
) -> Page {
    let skip = skip.unwrap_or(0);
    if skip < 0 {
        invalid.add("skip", "skip must be zero or greater");
    }

    let limit = limit.unwrap_or(limits.default_limit);
    if limit <= 0 {
        invalid.add("limit", "limit must be greater than zero");
    }

    Page::new(skip.max(0), limit.clamp(1, limits.max_limit.max(1)))
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse repeated and/or comma-separated values into typed values.
fn parse_multi<T: FromStr>(
    field: &str,
    raw: &[String],
    invalid: &mut InvalidParams,
) -> Vec<T>
where
    T::Err: std::fmt::Display,
{
    let mut values = Vec::new();
    for part in raw.iter().flat_map(|r| r.split(',')) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match part.parse::<T>() {
            Ok(v) => values.push(v),
            Err(e) => invalid.add(field, e.to_string()),
        }
    }
    values
}

fn parse_one<T: FromStr>(field: &str, raw: Option<String>, invalid: &mut InvalidParams) -> Vec<T>
where
    T::Err: std::fmt::Display,
{
    match trimmed(raw) {
        Some(value) => parse_multi(field, &[value], invalid),
        None => Vec::new(),
    }
}

/// Parameters of `GET /hr/employees/advanced-search`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdvancedSearchParams {
    pub search: Option<String>,
    #[serde(default)]
    pub department_ids: Vec<String>,
    #[serde(default)]
    pub position_ids: Vec<String>,
    #[serde(default)]
    pub employment_types: Vec<String>,
    #[serde(default)]
    pub work_types: Vec<String>,
    #[serde(default)]
    pub statuses: Vec<String>,
    pub sort_by: Option<String>,
    pub sort_desc: Option<bool>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// Parameters of `GET /hr/employees/search`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeSearchParams {
    pub name: Option<String>,
    pub email: Option<String>,
    pub department_id: Option<i64>,
    pub position_id: Option<i64>,
    pub employment_type: Option<String>,
    pub work_type: Option<String>,
    pub status: Option<String>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// Validated employee filter, ordering and pagination window
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmployeeFilter {
    /// Substring over first name, last name, email and phone
    pub search: Option<String>,
    /// Substring over first or last name
    pub name: Option<String>,
    /// Substring over email
    pub email: Option<String>,
    pub department_ids: Vec<i64>,
    pub position_ids: Vec<i64>,
    pub employment_types: Vec<EmploymentType>,
    pub work_types: Vec<WorkType>,
    pub statuses: Vec<EmployeeStatus>,
    pub sort_by: EmployeeSortField,
    pub direction: SortDirection,
    pub page: Page,
}

impl EmployeeFilter {
    pub fn from_advanced(
        params: AdvancedSearchParams,
        limits: &SearchConfig,
    ) -> Result<Self, InvalidParams> {
        let mut invalid = InvalidParams::default();

        let sort_by = match trimmed(params.sort_by) {
            Some(raw) => raw.parse().unwrap_or_else(|e: String| {
                invalid.add("sort_by", e);
                EmployeeSortField::default()
            }),
            None => EmployeeSortField::default(),
        };

        let filter = EmployeeFilter {
            search: trimmed(params.search),
            name: None,
            email: None,
            department_ids: parse_multi("department_ids", &params.department_ids, &mut invalid),
            position_ids: parse_multi("position_ids", &params.position_ids, &mut invalid),
            employment_types: parse_multi(
                "employment_types",
                &params.employment_types,
                &mut invalid,
            ),
            work_types: parse_multi("work_types", &params.work_types, &mut invalid),
            statuses: parse_multi("statuses", &params.statuses, &mut invalid),
            sort_by,
            direction: SortDirection::from_desc_flag(params.sort_desc.unwrap_or(false)),
            page: resolve_page(params.skip, params.limit, limits, &mut invalid),
        };

        invalid.finish(filter)
    }

    pub fn from_simple(
        params: EmployeeSearchParams,
        limits: &SearchConfig,
    ) -> Result<Self, InvalidParams> {
        let mut invalid = InvalidParams::default();

        let filter = EmployeeFilter {
            search: None,
            name: trimmed(params.name),
            email: trimmed(params.email),
            department_ids: params.department_id.into_iter().collect(),
            position_ids: params.position_id.into_iter().collect(),
            employment_types: parse_one("employment_type", params.employment_type, &mut invalid),
            work_types: parse_one("work_type", params.work_type, &mut invalid),
            statuses: parse_one("status", params.status, &mut invalid),
            sort_by: EmployeeSortField::default(),
            direction: SortDirection::Asc,
            page: resolve_page(params.skip, params.limit, limits, &mut invalid),
        };

        invalid.finish(filter)
    }

    /// Append the `WHERE` clause (if any filter is set).
    pub fn push_where<'args>(&self, qb: &mut QueryBuilder<'args, Sqlite>) {
        let mut conditions = Conditions::new(qb);

        if let Some(search) = &self.search {
            push_contains(
                conditions.next(),
                &["first_name", "last_name", "email", "phone"],
                search,
            );
        }
        if let Some(name) = &self.name {
            push_contains(conditions.next(), &["first_name", "last_name"], name);
        }
        if let Some(email) = &self.email {
            push_contains(conditions.next(), &["email"], email);
        }
        if !self.department_ids.is_empty() {
            push_in(conditions.next(), "department_id", &self.department_ids);
        }
        if !self.position_ids.is_empty() {
            push_in(conditions.next(), "position_id", &self.position_ids);
        }
        if !self.employment_types.is_empty() {
            push_in(conditions.next(), "employment_type", &self.employment_types);
        }
        if !self.work_types.is_empty() {
            push_in(conditions.next(), "work_type", &self.work_types);
        }
        if !self.statuses.is_empty() {
            push_in(conditions.next(), "status", &self.statuses);
        }
    }

    /// Append `ORDER BY`, always tie-broken by id, followed by `LIMIT`/`OFFSET`.
    pub fn push_order_and_page<'args>(&self, qb: &mut QueryBuilder<'args, Sqlite>) {
        qb.push(" ORDER BY ");
        qb.push(self.sort_by.column());
        qb.push(" ");
        qb.push(self.direction.as_sql());
        if self.sort_by != EmployeeSortField::Id {
            qb.push(", id ASC");
        }
        qb.push(" LIMIT ");
        qb.push_bind(self.page.limit);
        qb.push(" OFFSET ");
        qb.push_bind(self.page.skip);
    }
}

/// Parameters of `GET /hr/departments/search`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DepartmentSearchParams {
    pub query: Option<String>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DepartmentSearch {
    pub query: Option<String>,
    pub page: Page,
}

impl DepartmentSearch {
    pub fn from_params(
        params: DepartmentSearchParams,
        limits: &SearchConfig,
    ) -> Result<Self, InvalidParams> {
        let mut invalid = InvalidParams::default();
        let search = DepartmentSearch {
            query: trimmed(params.query),
            page: resolve_page(params.skip, params.limit, limits, &mut invalid),
        };
        invalid.finish(search)
    }

    pub fn push_where<'args>(&self, qb: &mut QueryBuilder<'args, Sqlite>) {
        if let Some(query) = &self.query {
            let mut conditions = Conditions::new(qb);
            push_contains(conditions.next(), &["title", "description"], query);
        }
    }
}

/// Parameters of `GET /hr/positions/search`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PositionSearchParams {
    pub title: Option<String>,
    pub min_salary: Option<f64>,
    pub max_salary: Option<f64>,
    pub department_id: Option<i64>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionSearch {
    /// Substring over title or description
    pub title: Option<String>,
    /// Keep positions whose lower salary bound is at least this
    pub min_salary: Option<f64>,
    /// Keep positions whose upper salary bound is at most this
    pub max_salary: Option<f64>,
    pub department_id: Option<i64>,
    pub page: Page,
}

impl PositionSearch {
    pub fn from_params(
        params: PositionSearchParams,
        limits: &SearchConfig,
    ) -> Result<Self, InvalidParams> {
        let mut invalid = InvalidParams::default();

        for (field, value) in [("min_salary", params.min_salary), ("max_salary", params.max_salary)] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    invalid.add(field, "must be a non-negative number");
                }
            }
        }
        if let (Some(min), Some(max)) = (params.min_salary, params.max_salary) {
            if min > max {
                invalid.add("min_salary", "min_salary must not exceed max_salary");
            }
        }

        let search = PositionSearch {
            title: trimmed(params.title),
            min_salary: params.min_salary,
            max_salary: params.max_salary,
            department_id: params.department_id,
            page: resolve_page(params.skip, params.limit, limits, &mut invalid),
        };
        invalid.finish(search)
    }

    pub fn push_where<'args>(&self, qb: &mut QueryBuilder<'args, Sqlite>) {
        let mut conditions = Conditions::new(qb);

        if let Some(title) = &self.title {
            push_contains(conditions.next(), &["title", "description"], title);
        }
        if let Some(min) = self.min_salary {
            conditions.next().push("salary_range_min >= ").push_bind(min);
        }
        if let Some(max) = self.max_salary {
            conditions.next().push("salary_range_max <= ").push_bind(max);
        }
        if let Some(department_id) = self.department_id {
            conditions.next().push("department_id = ").push_bind(department_id);
        }
    }
}

/// Emits ` WHERE ` before the first condition and ` AND ` before the rest.
struct Conditions<'q, 'args> {
    qb: &'q mut QueryBuilder<'args, Sqlite>,
    first: bool,
}

impl<'q, 'args> Conditions<'q, 'args> {
    fn new(qb: &'q mut QueryBuilder<'args, Sqlite>) -> Self {
        Self { qb, first: true }
    }

    fn next(&mut self) -> &mut QueryBuilder<'args, Sqlite> {
        self.qb.push(if self.first { " WHERE " } else { " AND " });
        self.first = false;
        &mut *self.qb
    }
}

/// `(a_lower LIKE ? OR b_lower LIKE ? ...)` over the lowercased search columns
fn push_contains(qb: &mut QueryBuilder<'_, Sqlite>, columns: &[&str], needle: &str) {
    let pattern = contains_pattern(needle);
    qb.push("(");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            qb.push(" OR ");
        }
        qb.push(*column);
        qb.push("_lower LIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" ESCAPE '\\'");
    }
    qb.push(")");
}

/// `column IN (?, ?, ...)`
fn push_in<'args, T>(qb: &mut QueryBuilder<'args, Sqlite>, column: &str, values: &[T])
where
    T: sqlx::Encode<'args, Sqlite> + sqlx::Type<Sqlite> + Copy + Send + 'args,
{
    qb.push(column);
    qb.push(" IN (");
    let mut separated = qb.separated(", ");
    for value in values {
        separated.push_bind(*value);
    }
    separated.push_unseparated(")");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> SearchConfig {
        SearchConfig {
            default_limit: 100,
            max_limit: 500,
        }
    }

    fn sql_for(filter: &EmployeeFilter) -> String {
        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new("SELECT * FROM employees");
        filter.push_where(&mut qb);
        filter.push_order_and_page(&mut qb);
        qb.sql().to_string()
    }

    #[test]
    fn test_empty_params_use_defaults() {
        let filter = EmployeeFilter::from_advanced(AdvancedSearchParams::default(), &limits()).unwrap();
        assert_eq!(filter.sort_by, EmployeeSortField::LastName);
        assert_eq!(filter.direction, SortDirection::Asc);
        assert_eq!(filter.page, Page::new(0, 100));
        assert_eq!(
            sql_for(&filter),
            "SELECT * FROM employees ORDER BY last_name ASC, id ASC LIMIT ? OFFSET ?"
        );
    }

    #[test]
    fn test_multi_values_accept_repeats_and_commas() {
        let params = AdvancedSearchParams {
            department_ids: vec!["1,3".to_string(), "5".to_string()],
            employment_types: vec!["full-time, intern".to_string()],
            statuses: vec!["".to_string()],
            ..Default::default()
        };
        let filter = EmployeeFilter::from_advanced(params, &limits()).unwrap();
        assert_eq!(filter.department_ids, vec![1, 3, 5]);
        assert_eq!(
            filter.employment_types,
            vec![EmploymentType::FullTime, EmploymentType::Intern]
        );
        assert!(filter.statuses.is_empty());
    }

    #[test]
    fn test_categories_are_and_combined() {
        let params = AdvancedSearchParams {
            search: Some("  ann ".to_string()),
            department_ids: vec!["1".to_string(), "2".to_string()],
            work_types: vec!["remote".to_string()],
            sort_by: Some("join_date".to_string()),
            sort_desc: Some(true),
            ..Default::default()
        };
        let filter = EmployeeFilter::from_advanced(params, &limits()).unwrap();
        assert_eq!(filter.search.as_deref(), Some("ann"));
        assert_eq!(
            sql_for(&filter),
            "SELECT * FROM employees WHERE (first_name_lower LIKE ? ESCAPE '\\' OR last_name_lower LIKE ? ESCAPE '\\' \
             OR email_lower LIKE ? ESCAPE '\\' OR phone_lower LIKE ? ESCAPE '\\') \
             AND department_id IN (?, ?) AND work_type IN (?) \
             ORDER BY join_date DESC, id ASC LIMIT ? OFFSET ?"
        );
    }

    #[test]
    fn test_unknown_sort_field_is_rejected() {
        let params = AdvancedSearchParams {
            sort_by: Some("salary; DROP TABLE employees".to_string()),
            ..Default::default()
        };
        let err = EmployeeFilter::from_advanced(params, &limits()).unwrap_err();
        assert!(err.errors["sort_by"][0].contains("Cannot sort by"));
    }

    #[test]
    fn test_sort_by_id_has_no_duplicate_tie_break() {
        let params = AdvancedSearchParams {
            sort_by: Some("id".to_string()),
            ..Default::default()
        };
        let filter = EmployeeFilter::from_advanced(params, &limits()).unwrap();
        assert!(sql_for(&filter).ends_with("ORDER BY id ASC LIMIT ? OFFSET ?"));
    }

    #[test]
    fn test_invalid_values_are_collected_per_field() {
        let params = AdvancedSearchParams {
            department_ids: vec!["one".to_string()],
            statuses: vec!["active,retired".to_string()],
            skip: Some(-1),
            limit: Some(0),
            ..Default::default()
        };
        let err = EmployeeFilter::from_advanced(params, &limits()).unwrap_err();
        assert!(err.errors.contains_key("department_ids"));
        assert!(err.errors.contains_key("statuses"));
        assert!(err.errors.contains_key("skip"));
        assert!(err.errors.contains_key("limit"));
    }

    #[test]
    fn test_limit_is_clamped_to_maximum() {
        let page = PageParams {
            skip: Some(10),
            limit: Some(10_000),
        }
        .resolve(&limits())
        .unwrap();
        assert_eq!(page, Page::new(10, 500));
    }

    #[test]
    fn test_simple_search_maps_single_values() {
        let params = EmployeeSearchParams {
            name: Some("smith".to_string()),
            department_id: Some(4),
            status: Some("on_leave".to_string()),
            ..Default::default()
        };
        let filter = EmployeeFilter::from_simple(params, &limits()).unwrap();
        assert_eq!(filter.department_ids, vec![4]);
        assert_eq!(filter.statuses, vec![EmployeeStatus::OnLeave]);
        assert!(sql_for(&filter).starts_with(
            "SELECT * FROM employees WHERE (first_name_lower LIKE ? ESCAPE '\\' OR last_name_lower LIKE ? ESCAPE '\\') AND department_id IN (?) AND status IN (?)"
        ));
    }

    #[test]
    fn test_position_search_rejects_inverted_range() {
        let params = PositionSearchParams {
            min_salary: Some(5000.0),
            max_salary: Some(1000.0),
            ..Default::default()
        };
        let err = PositionSearch::from_params(params, &limits()).unwrap_err();
        assert!(err.errors.contains_key("min_salary"));
    }

    #[test]
    fn test_position_search_where_clause() {
        let search = PositionSearch {
            title: Some("eng".to_string()),
            min_salary: Some(1000.0),
            max_salary: None,
            department_id: Some(2),
            page: Page::default(),
        };
        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new("SELECT * FROM positions");
        search.push_where(&mut qb);
        assert_eq!(
            qb.sql(),
            "SELECT * FROM positions WHERE (title_lower LIKE ? ESCAPE '\\' OR description_lower LIKE ? ESCAPE '\\') \
             AND salary_range_min >= ? AND department_id = ?"
        );
    }
}
