//! Employee models and storage operations.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use super::common::{
    double_option, now_timestamp, search_text, EmployeeStatus, EmploymentType, Gender,
    MaritalStatus, Page, PartialUpdate, WorkType,
};
use super::position::Position;
use crate::db::query::EmployeeFilter;
use crate::db::{StoreError, StoreResult};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Employee {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub marital_status: Option<MaritalStatus>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub employment_type: Option<EmploymentType>,
    pub work_type: Option<WorkType>,
    pub working_days: Option<String>,
    pub join_date: Option<NaiveDate>,
    /// Annual cost to company
    pub ctc: Option<f64>,
    pub monthly_salary: Option<f64>,
    pub status: EmployeeStatus,
    pub department_id: i64,
    pub position_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEmployeeRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub marital_status: Option<MaritalStatus>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub employment_type: Option<EmploymentType>,
    pub work_type: Option<WorkType>,
    pub working_days: Option<String>,
    pub join_date: Option<NaiveDate>,
    pub ctc: Option<f64>,
    pub monthly_salary: Option<f64>,
    #[serde(default)]
    pub status: EmployeeStatus,
    pub department_id: i64,
    pub position_id: i64,
}

/// Partial update.
///
/// Absent fields keep their stored value. For the nullable fields an explicit
/// `null` (`Some(None)`) clears the stored value; for required fields `null`
/// is treated as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEmployeeRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub date_of_birth: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub gender: Option<Option<Gender>>,
    #[serde(default, deserialize_with = "double_option")]
    pub marital_status: Option<Option<MaritalStatus>>,
    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub employment_type: Option<Option<EmploymentType>>,
    #[serde(default, deserialize_with = "double_option")]
    pub work_type: Option<Option<WorkType>>,
    #[serde(default, deserialize_with = "double_option")]
    pub working_days: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub join_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub ctc: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub monthly_salary: Option<Option<f64>>,
    pub status: Option<EmployeeStatus>,
    pub department_id: Option<i64>,
    pub position_id: Option<i64>,
}

/// One page of search results plus the total number of matches
#[derive(Debug, Clone, Serialize)]
pub struct EmployeePage {
    pub items: Vec<Employee>,
    pub total: i64,
    pub skip: i64,
    pub limit: i64,
}

/// Check that both references exist and that the position sits in the department.
async fn check_assignment(
    conn: &mut SqliteConnection,
    department_id: i64,
    position_id: i64,
) -> StoreResult<()> {
    let department: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM departments WHERE id = ?")
        .bind(department_id)
        .fetch_one(&mut *conn)
        .await?;
    if department == 0 {
        return Err(StoreError::ConstraintViolation(format!(
            "Department {} does not exist",
            department_id
        )));
    }

    let position = match Position::fetch(conn, position_id).await {
        Ok(p) => p,
        Err(StoreError::NotFound { .. }) => {
            return Err(StoreError::ConstraintViolation(format!(
                "Position {} does not exist",
                position_id
            )))
        }
        Err(e) => return Err(e),
    };

    if position.department_id != department_id {
        return Err(StoreError::validation(
            "position_id",
            format!(
                "Position {} belongs to department {}, not {}",
                position_id, position.department_id, department_id
            ),
        ));
    }
    Ok(())
}

impl Employee {
    pub const ENTITY: &'static str = "Employee";

    pub async fn create(db: &SqlitePool, req: &CreateEmployeeRequest) -> StoreResult<Employee> {
        let mut tx = db.begin().await?;
        check_assignment(&mut tx, req.department_id, req.position_id).await?;

        let now = now_timestamp();
        let employee = sqlx::query_as::<_, Employee>(
            r#"
            INSERT INTO employees (
                first_name, last_name, email, phone, date_of_birth, gender, marital_status,
                address, city, employment_type, work_type, working_days, join_date,
                ctc, monthly_salary, status, department_id, position_id,
                first_name_lower, last_name_lower, email_lower, phone_lower, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&req.first_name)
        .bind(&req.last_name)
        .bind(&req.email)
        .bind(&req.phone)
        .bind(req.date_of_birth)
        .bind(req.gender)
        .bind(req.marital_status)
        .bind(&req.address)
        .bind(&req.city)
        .bind(req.employment_type)
        .bind(req.work_type)
        .bind(&req.working_days)
        .bind(req.join_date)
        .bind(req.ctc)
        .bind(req.monthly_salary)
        .bind(req.status)
        .bind(req.department_id)
        .bind(req.position_id)
        .bind(search_text(&req.first_name))
        .bind(search_text(&req.last_name))
        .bind(search_text(&req.email))
        .bind(req.phone.as_deref().map(search_text))
        .bind(&now)
        .bind(&now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(
            employee_id = employee.id,
            department_id = employee.department_id,
            position_id = employee.position_id,
            "Employee created"
        );
        Ok(employee)
    }

    pub async fn get(db: &SqlitePool, id: i64) -> StoreResult<Employee> {
        let mut conn = db.acquire().await?;
        Self::fetch(&mut conn, id).await
    }

    async fn fetch(conn: &mut SqliteConnection, id: i64) -> StoreResult<Employee> {
        sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| StoreError::not_found(Self::ENTITY, id))
    }

    pub async fn exists(db: &SqlitePool, id: i64) -> StoreResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees WHERE id = ?")
            .bind(id)
            .fetch_one(db)
            .await?;
        Ok(count > 0)
    }

    pub async fn list(db: &SqlitePool, page: Page) -> StoreResult<Vec<Employee>> {
        let employees = sqlx::query_as::<_, Employee>(
            "SELECT * FROM employees ORDER BY id ASC LIMIT ? OFFSET ?",
        )
        .bind(page.limit)
        .bind(page.skip)
        .fetch_all(db)
        .await?;
        Ok(employees)
    }

    /// Ids of every employee in a department, e.g. before a cascading delete.
    pub async fn ids_in_department(db: &SqlitePool, department_id: i64) -> StoreResult<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM employees WHERE department_id = ? ORDER BY id")
            .bind(department_id)
            .fetch_all(db)
            .await?;
        Ok(ids)
    }

    /// Partial update: absent fields keep their stored value.
    pub async fn update(
        db: &SqlitePool,
        id: i64,
        req: &UpdateEmployeeRequest,
    ) -> StoreResult<Employee> {
        let mut tx = db.begin().await?;
        let existing = Self::fetch(&mut tx, id).await?;

        if req.department_id.is_some() || req.position_id.is_some() {
            check_assignment(
                &mut tx,
                req.department_id.unwrap_or(existing.department_id),
                req.position_id.unwrap_or(existing.position_id),
            )
            .await?;
        }

        let mut update = PartialUpdate::new("employees", now_timestamp());
        update
            .set_some("first_name", req.first_name.as_deref())
            .set_some("first_name_lower", req.first_name.as_deref().map(search_text))
            .set_some("last_name", req.last_name.as_deref())
            .set_some("last_name_lower", req.last_name.as_deref().map(search_text))
            .set_some("email", req.email.as_deref())
            .set_some("email_lower", req.email.as_deref().map(search_text))
            .set_some("phone", req.phone.as_ref().map(|p| p.as_deref()))
            .set_some(
                "phone_lower",
                req.phone.as_ref().map(|p| p.as_deref().map(search_text)),
            )
            .set_some("date_of_birth", req.date_of_birth)
            .set_some("gender", req.gender)
            .set_some("marital_status", req.marital_status)
            .set_some("address", req.address.as_ref().map(|a| a.as_deref()))
            .set_some("city", req.city.as_ref().map(|c| c.as_deref()))
            .set_some("employment_type", req.employment_type)
            .set_some("work_type", req.work_type)
            .set_some("working_days", req.working_days.as_ref().map(|w| w.as_deref()))
            .set_some("join_date", req.join_date)
            .set_some("ctc", req.ctc)
            .set_some("monthly_salary", req.monthly_salary)
            .set_some("status", req.status)
            .set_some("department_id", req.department_id)
            .set_some("position_id", req.position_id);

        let mut qb = update.returning(id);
        let employee = qb.build_query_as::<Employee>().fetch_one(&mut *tx).await?;

        tx.commit().await?;
        Ok(employee)
    }

    /// Delete an employee and, by cascade, their documents.
    pub async fn delete(db: &SqlitePool, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM employees WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(Self::ENTITY, id));
        }
        Ok(())
    }

    /// Run a filtered, ordered, paginated search.
    ///
    /// Count and page are read inside one transaction so `total` and `items`
    /// describe the same snapshot.
    pub async fn search(db: &SqlitePool, filter: &EmployeeFilter) -> StoreResult<EmployeePage> {
        let mut tx = db.begin().await?;

        let mut count_qb: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM employees");
        filter.push_where(&mut count_qb);
        let total: i64 = count_qb.build_query_scalar::<i64>().fetch_one(&mut *tx).await?;

        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new("SELECT * FROM employees");
        filter.push_where(&mut qb);
        filter.push_order_and_page(&mut qb);
        let items = qb.build_query_as::<Employee>().fetch_all(&mut *tx).await?;

        tx.commit().await?;

        Ok(EmployeePage {
            items,
            total,
            skip: filter.page.skip,
            limit: filter.page.limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::db::query::{AdvancedSearchParams, EmployeeSortField, SortDirection};
    use crate::db::{
        init_in_memory, CreateDepartmentRequest, CreatePositionRequest, Department,
    };

    struct Fixture {
        db: SqlitePool,
        engineering: i64,
        sales: i64,
        backend: i64,
        frontend: i64,
        account_exec: i64,
    }

    async fn fixture() -> Fixture {
        let db = init_in_memory().await.unwrap();
        let dept = |title: &str| CreateDepartmentRequest {
            title: title.to_string(),
            description: None,
        };
        let engineering = Department::create(&db, &dept("Engineering")).await.unwrap().id;
        let sales = Department::create(&db, &dept("Sales")).await.unwrap().id;

        let pos = |title: &str, department_id: i64| CreatePositionRequest {
            title: title.to_string(),
            description: None,
            department_id,
            salary_range_min: None,
            salary_range_max: None,
        };
        let backend = Position::create(&db, &pos("Backend", engineering)).await.unwrap().id;
        let frontend = Position::create(&db, &pos("Frontend", engineering)).await.unwrap().id;
        let account_exec = Position::create(&db, &pos("Account Executive", sales)).await.unwrap().id;

        Fixture {
            db,
            engineering,
            sales,
            backend,
            frontend,
            account_exec,
        }
    }

    fn new_employee(first: &str, last: &str, department_id: i64, position_id: i64) -> CreateEmployeeRequest {
        CreateEmployeeRequest {
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase()),
            phone: None,
            date_of_birth: None,
            gender: None,
            marital_status: None,
            address: None,
            city: None,
            employment_type: None,
            work_type: None,
            working_days: None,
            join_date: None,
            ctc: None,
            monthly_salary: None,
            status: EmployeeStatus::default(),
            department_id,
            position_id,
        }
    }

    fn limits() -> SearchConfig {
        SearchConfig {
            default_limit: 100,
            max_limit: 500,
        }
    }

    async fn count(db: &SqlitePool, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(db)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_defaults_status_to_active() {
        let f = fixture().await;
        let mut req = new_employee("Ada", "Lovelace", f.engineering, f.backend);
        req.employment_type = Some(EmploymentType::FullTime);
        req.join_date = NaiveDate::from_ymd_opt(2024, 3, 1);
        req.ctc = Some(120000.0);

        let emp = Employee::create(&f.db, &req).await.unwrap();
        assert_eq!(emp.status, EmployeeStatus::Active);
        assert_eq!(emp.employment_type, Some(EmploymentType::FullTime));
        assert_eq!(emp.join_date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(emp.created_at, emp.updated_at);

        let fetched = Employee::get(&f.db, emp.id).await.unwrap();
        assert_eq!(fetched.email, "ada.lovelace@example.com");
    }

    #[tokio::test]
    async fn test_duplicate_email_is_constraint_violation() {
        let f = fixture().await;
        Employee::create(&f.db, &new_employee("Ada", "Lovelace", f.engineering, f.backend))
            .await
            .unwrap();

        let mut dup = new_employee("Grace", "Hopper", f.engineering, f.frontend);
        dup.email = "ada.lovelace@example.com".to_string();
        let err = Employee::create(&f.db, &dup).await.unwrap_err();

        assert!(matches!(err, StoreError::ConstraintViolation(_)));
        assert_eq!(count(&f.db, "employees").await, 1);
    }

    #[tokio::test]
    async fn test_position_must_match_department() {
        let f = fixture().await;
        let err = Employee::create(&f.db, &new_employee("Ada", "Lovelace", f.sales, f.backend))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation { field: "position_id", .. }));

        let err = Employee::create(&f.db, &new_employee("Ada", "Lovelace", f.engineering, 999))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation(_)));
        assert_eq!(count(&f.db, "employees").await, 0);
    }

    #[tokio::test]
    async fn test_partial_update_overwrites_only_supplied_fields() {
        let f = fixture().await;
        let mut req = new_employee("Ada", "Lovelace", f.engineering, f.backend);
        req.city = Some("London".to_string());
        req.work_type = Some(WorkType::Office);
        let emp = Employee::create(&f.db, &req).await.unwrap();

        let updated = Employee::update(
            &f.db,
            emp.id,
            &UpdateEmployeeRequest {
                work_type: Some(Some(WorkType::Remote)),
                status: Some(EmployeeStatus::OnLeave),
                position_id: Some(f.frontend),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.work_type, Some(WorkType::Remote));
        assert_eq!(updated.status, EmployeeStatus::OnLeave);
        assert_eq!(updated.position_id, f.frontend);
        assert_eq!(updated.city.as_deref(), Some("London"));
        assert_eq!(updated.first_name, "Ada");
        assert_eq!(updated.email, emp.email);
        assert_eq!(updated.created_at, emp.created_at);
    }

    #[tokio::test]
    async fn test_explicit_null_clears_optional_fields() {
        let f = fixture().await;
        let mut req = new_employee("Ada", "Lovelace", f.engineering, f.backend);
        req.phone = Some("+44 20 7946 0000".to_string());
        req.city = Some("London".to_string());
        req.ctc = Some(120000.0);
        let emp = Employee::create(&f.db, &req).await.unwrap();

        let patch: UpdateEmployeeRequest =
            serde_json::from_str(r#"{"phone": null, "ctc": null, "first_name": null}"#).unwrap();
        let updated = Employee::update(&f.db, emp.id, &patch).await.unwrap();
        assert_eq!(updated.phone, None);
        assert_eq!(updated.ctc, None);
        assert_eq!(updated.city.as_deref(), Some("London"));
        assert_eq!(updated.first_name, "Ada");

        let by_phone = EmployeeFilter {
            search: Some("7946".to_string()),
            ..Default::default()
        };
        assert_eq!(Employee::search(&f.db, &by_phone).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_update_to_foreign_position_is_rejected() {
        let f = fixture().await;
        let emp = Employee::create(&f.db, &new_employee("Ada", "Lovelace", f.engineering, f.backend))
            .await
            .unwrap();

        let err = Employee::update(
            &f.db,
            emp.id,
            &UpdateEmployeeRequest {
                position_id: Some(f.account_exec),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StoreError::Validation { .. }));

        // Moving both together is fine.
        let moved = Employee::update(
            &f.db,
            emp.id,
            &UpdateEmployeeRequest {
                department_id: Some(f.sales),
                position_id: Some(f.account_exec),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(moved.department_id, f.sales);
    }

    #[tokio::test]
    async fn test_update_to_taken_email_leaves_row_unchanged() {
        let f = fixture().await;
        let ada = Employee::create(&f.db, &new_employee("Ada", "Lovelace", f.engineering, f.backend))
            .await
            .unwrap();
        let grace = Employee::create(&f.db, &new_employee("Grace", "Hopper", f.engineering, f.backend))
            .await
            .unwrap();

        let err = Employee::update(
            &f.db,
            grace.id,
            &UpdateEmployeeRequest {
                email: Some(ada.email.clone()),
                city: Some(Some("Arlington".to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation(_)));

        let unchanged = Employee::get(&f.db, grace.id).await.unwrap();
        assert_eq!(unchanged.email, grace.email);
        assert_eq!(unchanged.city, None);
    }

    #[tokio::test]
    async fn test_department_delete_cascades() {
        let f = fixture().await;
        let ada = Employee::create(&f.db, &new_employee("Ada", "Lovelace", f.engineering, f.backend))
            .await
            .unwrap();
        let grace = Employee::create(&f.db, &new_employee("Grace", "Hopper", f.engineering, f.frontend))
            .await
            .unwrap();
        let zig = Employee::create(&f.db, &new_employee("Zig", "Ziglar", f.sales, f.account_exec))
            .await
            .unwrap();

        Department::delete(&f.db, f.engineering).await.unwrap();

        for id in [ada.id, grace.id] {
            assert!(matches!(
                Employee::get(&f.db, id).await,
                Err(StoreError::NotFound { .. })
            ));
        }
        for id in [f.backend, f.frontend] {
            assert!(matches!(
                Position::get(&f.db, id).await,
                Err(StoreError::NotFound { .. })
            ));
        }
        assert!(Employee::get(&f.db, zig.id).await.is_ok());
        assert_eq!(count(&f.db, "positions").await, 1);
    }

    #[tokio::test]
    async fn test_held_position_cannot_be_deleted_or_moved() {
        let f = fixture().await;
        Employee::create(&f.db, &new_employee("Ada", "Lovelace", f.engineering, f.backend))
            .await
            .unwrap();

        assert!(matches!(
            Position::delete(&f.db, f.backend).await,
            Err(StoreError::ConstraintViolation(_))
        ));

        let err = Position::update(
            &f.db,
            f.backend,
            &crate::db::UpdatePositionRequest {
                department_id: Some(f.sales),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation(_)));
    }

    async fn seed_search_data(f: &Fixture) {
        let rows = [
            ("Ada", "Lovelace", f.engineering, f.backend, EmploymentType::FullTime, WorkType::Remote, EmployeeStatus::Active, 150.0),
            ("Grace", "Hopper", f.engineering, f.frontend, EmploymentType::Intern, WorkType::Office, EmployeeStatus::Active, 90.0),
            ("Alan", "Turing", f.engineering, f.backend, EmploymentType::Contract, WorkType::Hybrid, EmployeeStatus::OnLeave, 150.0),
            ("Zig", "Ziglar", f.sales, f.account_exec, EmploymentType::FullTime, WorkType::Office, EmployeeStatus::Active, 80.0),
            ("Mary", "Kay", f.sales, f.account_exec, EmploymentType::Intern, WorkType::Remote, EmployeeStatus::Resigned, 70.0),
            ("Annie", "Easley", f.engineering, f.frontend, EmploymentType::FullTime, WorkType::Remote, EmployeeStatus::Active, 150.0),
        ];
        for (first, last, dept, pos, employment, work, status, ctc) in rows {
            let mut req = new_employee(first, last, dept, pos);
            req.employment_type = Some(employment);
            req.work_type = Some(work);
            req.status = status;
            req.ctc = Some(ctc);
            req.phone = Some(format!("+1-555-{}", last.len()));
            Employee::create(&f.db, &req).await.unwrap();
        }
    }

    fn last_names(page: &EmployeePage) -> Vec<&str> {
        page.items.iter().map(|e| e.last_name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_search_without_filters_uses_last_name_order() {
        let f = fixture().await;
        seed_search_data(&f).await;

        let page = Employee::search(&f.db, &EmployeeFilter::default()).await.unwrap();
        assert_eq!(page.total, 6);
        assert_eq!(
            last_names(&page),
            vec!["Easley", "Hopper", "Kay", "Lovelace", "Turing", "Ziglar"]
        );
    }

    #[tokio::test]
    async fn test_search_and_across_categories_or_within() {
        let f = fixture().await;
        seed_search_data(&f).await;

        let filter = EmployeeFilter::from_advanced(
            AdvancedSearchParams {
                employment_types: vec!["full-time".to_string(), "intern".to_string()],
                department_ids: vec![f.engineering.to_string()],
                ..Default::default()
            },
            &limits(),
        )
        .unwrap();
        let page = Employee::search(&f.db, &filter).await.unwrap();

        assert_eq!(last_names(&page), vec!["Easley", "Hopper", "Lovelace"]);
        for e in &page.items {
            assert_eq!(e.department_id, f.engineering);
            assert!(matches!(
                e.employment_type,
                Some(EmploymentType::FullTime) | Some(EmploymentType::Intern)
            ));
        }
    }

    #[tokio::test]
    async fn test_search_text_is_case_insensitive_over_all_fields() {
        let f = fixture().await;
        seed_search_data(&f).await;

        let by_name = EmployeeFilter {
            search: Some("AN".to_string()),
            ..Default::default()
        };
        let page = Employee::search(&f.db, &by_name).await.unwrap();
        // Only Alan and Annie contain "an" in any searched field.
        assert_eq!(last_names(&page), vec!["Easley", "Turing"]);

        let by_email = EmployeeFilter {
            search: Some("mary.kay@".to_string()),
            statuses: vec![EmployeeStatus::Resigned],
            ..Default::default()
        };
        let page = Employee::search(&f.db, &by_email).await.unwrap();
        assert_eq!(last_names(&page), vec!["Kay"]);

        let wildcard = EmployeeFilter {
            search: Some("%".to_string()),
            ..Default::default()
        };
        assert_eq!(Employee::search(&f.db, &wildcard).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_search_text_is_case_insensitive_beyond_ascii() {
        let f = fixture().await;
        let emp = Employee::create(&f.db, &new_employee("Émile", "Öztürk", f.engineering, f.backend))
            .await
            .unwrap();
        Employee::create(&f.db, &new_employee("Emil", "Ozturk", f.engineering, f.backend))
            .await
            .unwrap();

        for term in ["Émile", "émile", "ÉMILE", "Öztürk", "ÖZTÜRK", "öztürk"] {
            let filter = EmployeeFilter {
                search: Some(term.to_string()),
                ..Default::default()
            };
            let page = Employee::search(&f.db, &filter).await.unwrap();
            assert_eq!(page.total, 1, "searching {term}");
            assert_eq!(page.items[0].id, emp.id);

            let by_name = EmployeeFilter {
                name: Some(term.to_string()),
                ..Default::default()
            };
            assert_eq!(Employee::search(&f.db, &by_name).await.unwrap().total, 1);
        }

        // Renaming keeps the search columns in step.
        Employee::update(
            &f.db,
            emp.id,
            &UpdateEmployeeRequest {
                last_name: Some("Ünal".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let filter = EmployeeFilter {
            search: Some("ÜNAL".to_string()),
            ..Default::default()
        };
        assert_eq!(Employee::search(&f.db, &filter).await.unwrap().total, 1);
        let stale = EmployeeFilter {
            name: Some("öztürk".to_string()),
            ..Default::default()
        };
        assert_eq!(Employee::search(&f.db, &stale).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_search_sort_ties_break_by_id_and_pages_are_stable() {
        let f = fixture().await;
        seed_search_data(&f).await;

        let filter = EmployeeFilter {
            sort_by: EmployeeSortField::Ctc,
            direction: SortDirection::Desc,
            page: Page::new(0, 2),
            ..Default::default()
        };
        let first = Employee::search(&f.db, &filter).await.unwrap();
        // Three employees share ctc 150; insertion (id) order decides.
        assert_eq!(last_names(&first), vec!["Lovelace", "Turing"]);
        assert_eq!(first.total, 6);

        // An unrelated write must not disturb the page.
        Department::create(
            &f.db,
            &CreateDepartmentRequest {
                title: "Legal".to_string(),
                description: None,
            },
        )
        .await
        .unwrap();
        let again = Employee::search(&f.db, &filter).await.unwrap();
        assert_eq!(last_names(&again), last_names(&first));

        let second = Employee::search(
            &f.db,
            &EmployeeFilter {
                page: Page::new(2, 2),
                ..filter.clone()
            },
        )
        .await
        .unwrap();
        assert_eq!(last_names(&second), vec!["Easley", "Hopper"]);
    }

    #[tokio::test]
    async fn test_simple_name_filter() {
        let f = fixture().await;
        seed_search_data(&f).await;

        let filter = EmployeeFilter {
            name: Some("ziG".to_string()),
            department_ids: vec![f.sales],
            ..Default::default()
        };
        let page = Employee::search(&f.db, &filter).await.unwrap();
        assert_eq!(last_names(&page), vec!["Ziglar"]);
    }
}
