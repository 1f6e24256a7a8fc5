//! Defines data structures for the application.
//!
//! Includes one typed row struct per repository query. All derive
//! `sqlx::FromRow` so query results map directly onto them; nullable columns
//! (an employee's manager) are `Option` fields rather than sentinel values.

use serde::Serialize;
use sqlx::types::Decimal;

/// A department row, as returned by `list_departments`.
#[derive(Debug, Serialize, Clone, sqlx::FromRow)]
pub struct Department {
    pub id: i32,
    pub name: String,
}

/// A role joined with its department's name, as returned by `list_roles`.
#[derive(Debug, Serialize, Clone, sqlx::FromRow)]
pub struct RoleRow {
    pub id: i32,
    pub title: String,
    /// Salary stored as `Decimal` for precision.
    pub salary: Decimal,
    pub department_id: i32,
    pub department_name: String,
}

/// An employee joined with role title, department name and manager name,
/// as returned by `list_employees`.
///
/// `manager_name` is `None` for employees without a manager; the self-join
/// producing it is a LEFT JOIN.
#[derive(Debug, Serialize, Clone, sqlx::FromRow)]
pub struct EmployeeRow {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub title: String,
    pub department_name: String,
    pub manager_name: Option<String>,
}

impl EmployeeRow {
    /// The employee's display name, used as a choice-list label.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// The utilized budget of a department: the sum of salaries of all roles
/// held by at least one of its employees.
#[derive(Debug, Serialize, Clone, sqlx::FromRow)]
pub struct DepartmentBudget {
    pub department_name: String,
    /// Zero when the department has no employees.
    pub total_budget: Decimal,
}
