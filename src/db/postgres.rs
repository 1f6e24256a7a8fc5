//! Provides PostgreSQL database interaction functionalities using `sqlx`.
//!
//! Includes capabilities for establishing connection pools, initializing the database schema,
//! the CRUD repository operations for departments, roles and employees, and bulk
//! seed-script execution. Also contains integration tests for database operations
//! (requires the `integration-tests` feature).

use crate::error::{AppError, Result};
use crate::models::{Department, DepartmentBudget, EmployeeRow, RoleRow};
use sqlx::types::Decimal;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};
use tracing::{debug, error, info};

/// The built-in seed script: a `;`-delimited batch of INSERT statements
/// populating sample departments, roles and employees.
pub const SEED_SCRIPT: &str = include_str!("seeds.sql");

/// Represents the database connection pool and provides methods for database operations.
///
/// Holds a `sqlx::Pool` for efficient connection management. The pool is
/// constructed once at startup and handed to the CLI layer; there is no
/// process-wide singleton.
pub struct Database {
    pool: Pool<Postgres>,
}

impl Database {
    /// Creates a new `Database` instance by establishing a connection pool.
    ///
    /// # Arguments
    ///
    /// * `database_url` - The connection string for the PostgreSQL database.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the connection pool cannot be established.
    pub async fn new(database_url: &str) -> Result<Self> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(10) // Configure maximum number of connections in the pool
            .connect(database_url)
            .await
            .map_err(|e| {
                error!("Failed to connect to database: {}", e);
                AppError::Db(e.into())
            })?;

        info!("Connected to database successfully");
        Ok(Self { pool })
    }

    /// Initializes the database schema by creating the `department`, `role` and
    /// `employee` tables and indexes on their foreign-key columns.
    ///
    /// Uses `CREATE TABLE IF NOT EXISTS` and `CREATE INDEX IF NOT EXISTS` to be
    /// idempotent, so it can be safely run on every startup.
    ///
    /// Deletion policy: deleting a department cascades to its roles, deleting a
    /// role cascades to its employees, and deleting a manager sets the
    /// `manager_id` of their reports to NULL.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if any SQL query fails during schema creation.
    pub async fn init_schema(&self) -> Result<()> {
        info!("Initializing database schema (if necessary)...");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS department (
                id SERIAL PRIMARY KEY,
                name TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create department table: {}", e);
            AppError::Db(e.into())
        })?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS role (
                id SERIAL PRIMARY KEY,
                title TEXT NOT NULL,
                salary NUMERIC NOT NULL, -- Using NUMERIC for precise storage
                department_id INTEGER NOT NULL
                    REFERENCES department(id) ON DELETE CASCADE
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create role table: {}", e);
            AppError::Db(e.into())
        })?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS employee (
                id SERIAL PRIMARY KEY,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                role_id INTEGER NOT NULL
                    REFERENCES role(id) ON DELETE CASCADE,
                manager_id INTEGER
                    REFERENCES employee(id) ON DELETE SET NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create employee table: {}", e);
            AppError::Db(e.into())
        })?;

        // Indexes on the foreign-key columns to speed up the join queries.
        for (index, table, column) in [
            ("idx_role_department_id", "role", "department_id"),
            ("idx_employee_role_id", "employee", "role_id"),
            ("idx_employee_manager_id", "employee", "manager_id"),
        ] {
            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS {index} ON {table}({column})"
            ))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to create index {}: {}", index, e);
                AppError::Db(e.into())
            })?;
        }

        info!("Database schema initialized successfully");
        Ok(())
    }

    /// Fetches all departments, ordered by id.
    pub async fn list_departments(&self) -> Result<Vec<Department>> {
        debug!("Fetching all departments");
        let rows = sqlx::query_as::<_, Department>(
            "SELECT id, name FROM department ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to fetch departments: {}", e);
            AppError::Db(e.into())
        })?;
        Ok(rows)
    }

    /// Fetches all roles joined with their department's name, ordered by id.
    pub async fn list_roles(&self) -> Result<Vec<RoleRow>> {
        debug!("Fetching all roles");
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT
                role.id,
                role.title,
                role.salary,
                role.department_id,
                department.name AS department_name
            FROM role
            JOIN department ON role.department_id = department.id
            ORDER BY role.id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to fetch roles: {}", e);
            AppError::Db(e.into())
        })?;
        Ok(rows)
    }

    /// Fetches all employees joined with role title, department name and the
    /// manager's full name, ordered by id.
    ///
    /// The manager name comes from a LEFT self-join, so it is NULL (mapped to
    /// `None`) for employees without a manager.
    pub async fn list_employees(&self) -> Result<Vec<EmployeeRow>> {
        debug!("Fetching all employees");
        let rows = sqlx::query_as::<_, EmployeeRow>(
            r#"
            SELECT
                employee.id,
                employee.first_name,
                employee.last_name,
                role.title,
                department.name AS department_name,
                manager.first_name || ' ' || manager.last_name AS manager_name
            FROM employee
            JOIN role ON employee.role_id = role.id
            JOIN department ON role.department_id = department.id
            LEFT JOIN employee AS manager ON employee.manager_id = manager.id
            ORDER BY employee.id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to fetch employees: {}", e);
            AppError::Db(e.into())
        })?;
        Ok(rows)
    }

    /// Inserts a new department and returns its generated id.
    pub async fn add_department(&self, name: &str) -> Result<i32> {
        info!("Adding department '{}'", name);
        let (id,): (i32,) =
            sqlx::query_as("INSERT INTO department (name) VALUES ($1) RETURNING id")
                .bind(name)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    error!("Failed to insert department '{}': {}", name, e);
                    AppError::Db(e.into())
                })?;
        Ok(id)
    }

    /// Inserts a new role and returns its generated id.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if `department_id` does not reference an existing
    /// department (foreign-key violation); no row is created in that case.
    pub async fn add_role(&self, title: &str, salary: Decimal, department_id: i32) -> Result<i32> {
        info!("Adding role '{}' to department {}", title, department_id);
        let (id,): (i32,) = sqlx::query_as(
            "INSERT INTO role (title, salary, department_id) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(title)
        .bind(salary)
        .bind(department_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to insert role '{}': {}", title, e);
            AppError::Db(e.into())
        })?;
        Ok(id)
    }

    /// Inserts a new employee and returns its generated id.
    ///
    /// When `manager_id` is `None` the INSERT omits the manager column entirely
    /// rather than binding a NULL foreign key.
    pub async fn add_employee(
        &self,
        first_name: &str,
        last_name: &str,
        role_id: i32,
        manager_id: Option<i32>,
    ) -> Result<i32> {
        info!(
            "Adding employee '{} {}' with role {} (manager: {:?})",
            first_name, last_name, role_id, manager_id
        );
        let query = match manager_id {
            Some(manager_id) => sqlx::query_as(
                r#"
                INSERT INTO employee (first_name, last_name, role_id, manager_id)
                VALUES ($1, $2, $3, $4)
                RETURNING id
                "#,
            )
            .bind(first_name)
            .bind(last_name)
            .bind(role_id)
            .bind(manager_id),
            None => sqlx::query_as(
                r#"
                INSERT INTO employee (first_name, last_name, role_id)
                VALUES ($1, $2, $3)
                RETURNING id
                "#,
            )
            .bind(first_name)
            .bind(last_name)
            .bind(role_id),
        };

        let (id,): (i32,) = query.fetch_one(&self.pool).await.map_err(|e| {
            error!(
                "Failed to insert employee '{} {}': {}",
                first_name, last_name, e
            );
            AppError::Db(e.into())
        })?;
        Ok(id)
    }

    /// Reassigns an employee to a new role.
    pub async fn update_employee_role(&self, employee_id: i32, role_id: i32) -> Result<()> {
        info!("Updating employee {} to role {}", employee_id, role_id);
        let result = sqlx::query("UPDATE employee SET role_id = $1 WHERE id = $2")
            .bind(role_id)
            .bind(employee_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to update role of employee {}: {}", employee_id, e);
                AppError::Db(e.into())
            })?;
        debug!("Updated {} employee row(s)", result.rows_affected());
        Ok(())
    }

    /// Deletes a department by id. Dependent roles (and their employees) are
    /// removed by the cascade.
    pub async fn delete_department(&self, id: i32) -> Result<()> {
        info!("Deleting department {}", id);
        let result = sqlx::query("DELETE FROM department WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to delete department {}: {}", id, e);
                AppError::Db(e.into())
            })?;
        debug!("Deleted {} department row(s)", result.rows_affected());
        Ok(())
    }

    /// Deletes a role by id. Dependent employees are removed by the cascade.
    pub async fn delete_role(&self, id: i32) -> Result<()> {
        info!("Deleting role {}", id);
        let result = sqlx::query("DELETE FROM role WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to delete role {}: {}", id, e);
                AppError::Db(e.into())
            })?;
        debug!("Deleted {} role row(s)", result.rows_affected());
        Ok(())
    }

    /// Deletes an employee by id. Reports of the deleted employee get a NULL
    /// manager rather than being removed.
    pub async fn delete_employee(&self, id: i32) -> Result<()> {
        info!("Deleting employee {}", id);
        let result = sqlx::query("DELETE FROM employee WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to delete employee {}: {}", id, e);
                AppError::Db(e.into())
            })?;
        debug!("Deleted {} employee row(s)", result.rows_affected());
        Ok(())
    }

    /// Calculates the utilized budget of a department: the sum of salaries of
    /// the roles held by each of its employees.
    ///
    /// A salary is counted once per employee holding the role; a department
    /// with no employees has a budget of zero.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails, including when
    /// `department_id` does not reference an existing department.
    pub async fn department_budget(&self, department_id: i32) -> Result<DepartmentBudget> {
        info!("Calculating budget for department {}", department_id);
        let budget = sqlx::query_as::<_, DepartmentBudget>(
            r#"
            SELECT
                department.name AS department_name,
                COALESCE(
                    (
                        SELECT SUM(role.salary)
                        FROM employee
                        JOIN role ON employee.role_id = role.id
                        WHERE role.department_id = department.id
                    ),
                    0
                ) AS total_budget
            FROM department
            WHERE department.id = $1
            "#,
        )
        .bind(department_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Failed to calculate budget for department {}: {}",
                department_id, e
            );
            AppError::Db(e.into())
        })?;
        Ok(budget)
    }

    /// Executes a `;`-delimited seed script against a single pooled connection.
    ///
    /// Each non-empty statement runs sequentially; the connection is returned
    /// to the pool when the guard drops, on success and failure alike.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` on the first failing statement; earlier
    /// statements stay committed (the script is not transactional).
    pub async fn import_seed_script(&self, script: &str) -> Result<()> {
        info!("Importing seed script...");
        let mut conn = self.pool.acquire().await.map_err(|e| {
            error!("Failed to acquire connection for seed import: {}", e);
            AppError::Db(e.into())
        })?;

        let mut executed = 0usize;
        for statement in script.split(';') {
            let statement = statement.trim();
            if statement.is_empty() {
                continue;
            }
            sqlx::query(statement)
                .execute(&mut *conn)
                .await
                .map_err(|e| {
                    error!("Seed statement failed: {}", e);
                    AppError::Db(e.into())
                })?;
            executed += 1;
        }

        info!("Seed import completed ({} statements)", executed);
        Ok(())
    }

    /// Checks whether the schema has been created, by probing
    /// `information_schema` for the `employee` table.
    pub async fn is_schema_initialized(&self) -> Result<bool> {
        debug!("Checking if database schema is initialized...");
        let query = "SELECT EXISTS (SELECT FROM information_schema.tables WHERE table_schema = 'public' AND table_name = 'employee')";
        let initialized = sqlx::query_scalar::<_, bool>(query)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to check schema existence: {}", e);
                AppError::Db(e.into())
            })?;
        debug!("Schema initialized status: {}", initialized);
        Ok(initialized)
    }
}

// --- Integration Tests ---
// These tests interact with a real PostgreSQL database.
// They are gated by the `integration-tests` feature flag.
// Run using: `cargo test --features integration-tests`
// Requires a running PostgreSQL instance configured via DATABASE_URL env var.
#[cfg(test)]
#[cfg(feature = "integration-tests")] // Apply feature gate to the whole module
mod tests {
    use super::*;
    use sqlx::PgPool; // PgPool is injected by #[sqlx::test]

    /// Seeds a minimal org chart and returns
    /// (engineering_id, engineer_role_id, ada_id).
    async fn seed_org(db: &Database) -> Result<(i32, i32, i32)> {
        db.init_schema().await?;
        let engineering = db.add_department("Engineering").await?;
        let engineer = db
            .add_role("Engineer", Decimal::from(100_000), engineering)
            .await?;
        let ada = db.add_employee("Ada", "Lovelace", engineer, None).await?;
        Ok((engineering, engineer, ada))
    }

    #[sqlx::test]
    async fn test_init_schema(pool: PgPool) -> Result<()> {
        let db = Database { pool };
        db.init_schema().await?;
        assert!(db.is_schema_initialized().await?);

        for table in ["department", "role", "employee"] {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS (SELECT FROM information_schema.tables WHERE table_schema = 'public' AND table_name = $1)",
            )
            .bind(table)
            .fetch_one(&db.pool)
            .await?;
            assert!(exists, "table {} should exist after init_schema", table);
        }

        // Idempotent: a second run must not fail.
        db.init_schema().await?;
        Ok(())
    }

    #[sqlx::test]
    async fn test_schema_not_initialized_on_fresh_db(pool: PgPool) -> Result<()> {
        let db = Database { pool };
        assert!(!db.is_schema_initialized().await?);
        Ok(())
    }

    /// Lists reflect exactly the net set of committed rows after a sequence
    /// of add and delete operations.
    #[sqlx::test]
    async fn test_lists_reflect_net_rows(pool: PgPool) -> Result<()> {
        let db = Database { pool };
        let (engineering, engineer, ada) = seed_org(&db).await?;

        let sales = db.add_department("Sales").await?;
        let seller = db.add_role("Salesperson", Decimal::from(80_000), sales).await?;
        let bob = db.add_employee("Bob", "Jones", seller, Some(ada)).await?;

        assert_eq!(db.list_departments().await?.len(), 2);
        assert_eq!(db.list_roles().await?.len(), 2);
        assert_eq!(db.list_employees().await?.len(), 2);

        db.delete_employee(bob).await?;
        assert_eq!(db.list_employees().await?.len(), 1);

        db.delete_role(seller).await?;
        assert_eq!(db.list_roles().await?.len(), 1);

        db.delete_department(sales).await?;
        assert_eq!(db.list_departments().await?.len(), 1);

        // The untouched rows are still there.
        let roles = db.list_roles().await?;
        assert_eq!(roles[0].id, engineer);
        assert_eq!(roles[0].department_id, engineering);
        Ok(())
    }

    /// A role referencing a non-existent department is rejected by the
    /// foreign key and no row is created.
    #[sqlx::test]
    async fn test_add_role_with_bad_department_fails(pool: PgPool) -> Result<()> {
        let db = Database { pool };
        db.init_schema().await?;

        let result = db.add_role("Ghost", Decimal::from(1), 9999).await;
        assert!(matches!(result, Err(AppError::Db(_))));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM role")
            .fetch_one(&db.pool)
            .await?;
        assert_eq!(count, 0, "no role row should be created on FK violation");
        Ok(())
    }

    /// An employee inserted without a manager lists with an absent manager name.
    #[sqlx::test]
    async fn test_employee_without_manager(pool: PgPool) -> Result<()> {
        let db = Database { pool };
        let (_, engineer, ada) = seed_org(&db).await?;
        db.add_employee("Alan", "Turing", engineer, Some(ada)).await?;

        let employees = db.list_employees().await?;
        assert_eq!(employees.len(), 2);
        assert_eq!(employees[0].manager_name, None);
        assert_eq!(employees[1].manager_name.as_deref(), Some("Ada Lovelace"));
        Ok(())
    }

    #[sqlx::test]
    async fn test_update_employee_role(pool: PgPool) -> Result<()> {
        let db = Database { pool };
        let (engineering, _, ada) = seed_org(&db).await?;
        let lead = db
            .add_role("Lead Engineer", Decimal::from(150_000), engineering)
            .await?;

        db.update_employee_role(ada, lead).await?;

        let employees = db.list_employees().await?;
        assert_eq!(employees[0].title, "Lead Engineer");
        Ok(())
    }

    /// Budget equals the sum of salaries over employed roles and is zero for
    /// a department with no employees.
    #[sqlx::test]
    async fn test_department_budget(pool: PgPool) -> Result<()> {
        let db = Database { pool };
        let (engineering, _, _) = seed_org(&db).await?;

        // A role nobody holds does not count towards the budget.
        db.add_role("Architect", Decimal::from(999_999), engineering)
            .await?;

        let budget = db.department_budget(engineering).await?;
        assert_eq!(budget.department_name, "Engineering");
        assert_eq!(budget.total_budget, Decimal::from(100_000));

        let empty = db.add_department("Legal").await?;
        let budget = db.department_budget(empty).await?;
        assert_eq!(budget.total_budget, Decimal::ZERO);
        Ok(())
    }

    /// Deleting a department cascades to its roles and their employees.
    #[sqlx::test]
    async fn test_delete_department_cascades(pool: PgPool) -> Result<()> {
        let db = Database { pool };
        let (engineering, _, _) = seed_org(&db).await?;

        db.delete_department(engineering).await?;

        assert!(db.list_departments().await?.is_empty());
        assert!(db.list_roles().await?.is_empty());
        assert!(db.list_employees().await?.is_empty());
        Ok(())
    }

    /// Deleting a manager leaves their reports in place with no manager.
    #[sqlx::test]
    async fn test_delete_manager_orphans_reports(pool: PgPool) -> Result<()> {
        let db = Database { pool };
        let (_, engineer, ada) = seed_org(&db).await?;
        db.add_employee("Alan", "Turing", engineer, Some(ada)).await?;

        db.delete_employee(ada).await?;

        let employees = db.list_employees().await?;
        assert_eq!(employees.len(), 1);
        assert_eq!(employees[0].first_name, "Alan");
        assert_eq!(employees[0].manager_name, None);
        Ok(())
    }

    #[sqlx::test]
    async fn test_import_seed_script(pool: PgPool) -> Result<()> {
        let db = Database { pool };
        db.init_schema().await?;

        db.import_seed_script(SEED_SCRIPT).await?;

        assert_eq!(db.list_departments().await?.len(), 4);
        assert_eq!(db.list_roles().await?.len(), 8);
        assert_eq!(db.list_employees().await?.len(), 9);

        // Self-join resolves seeded managers.
        let employees = db.list_employees().await?;
        assert_eq!(employees[1].manager_name.as_deref(), Some("Grace Hopper"));
        Ok(())
    }

    /// A failing statement mid-script surfaces the error and leaves the
    /// connection usable for further operations.
    #[sqlx::test]
    async fn test_seed_script_failure_is_surfaced(pool: PgPool) -> Result<()> {
        let db = Database { pool };
        db.init_schema().await?;

        let script = "INSERT INTO department (name) VALUES ('Ops'); INSERT INTO nowhere VALUES (1);";
        let result = db.import_seed_script(script).await;
        assert!(matches!(result, Err(AppError::Db(_))));

        // Earlier statements are committed, and the pool still serves queries.
        assert_eq!(db.list_departments().await?.len(), 1);
        Ok(())
    }

    /// End-to-end: Engineering -> Engineer -> Ada Lovelace with no manager.
    #[sqlx::test]
    async fn test_end_to_end_engineering(pool: PgPool) -> Result<()> {
        let db = Database { pool };
        db.init_schema().await?;

        let engineering = db.add_department("Engineering").await?;
        let engineer = db
            .add_role("Engineer", Decimal::from(100_000), engineering)
            .await?;
        db.add_employee("Ada", "Lovelace", engineer, None).await?;

        let employees = db.list_employees().await?;
        assert_eq!(employees.len(), 1);
        let ada = &employees[0];
        assert_eq!(ada.full_name(), "Ada Lovelace");
        assert_eq!(ada.title, "Engineer");
        assert_eq!(ada.department_name, "Engineering");
        assert_eq!(ada.manager_name, None);
        Ok(())
    }

    /// Sequential operations neither exhaust nor leak pool connections: the
    /// idle count returns to the pool size once the work settles.
    #[sqlx::test]
    async fn test_pool_connections_are_released(pool: PgPool) -> Result<()> {
        let db = Database { pool };
        db.init_schema().await?;

        for i in 0..25 {
            let id = db.add_department(&format!("Department {}", i)).await?;
            db.list_departments().await?;
            db.delete_department(id).await?;
        }

        // Connection return happens on guard drop; give it a beat to settle.
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert_eq!(
            db.pool.num_idle() as u32,
            db.pool.size(),
            "all pooled connections should be idle after sequential operations"
        );
        Ok(())
    }
}
