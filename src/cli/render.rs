//! Tabular rendering of query results.
//!
//! Stateless: each function projects a slice of typed rows into a
//! `comfy_table::Table` with named columns. Callers print the table and add
//! any "no rows" note themselves.

use crate::models::{Department, DepartmentBudget, EmployeeRow, RoleRow};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

fn base_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn departments_table(departments: &[Department]) -> Table {
    let mut table = base_table(vec!["ID", "Name"]);
    for d in departments {
        table.add_row(vec![d.id.to_string(), d.name.clone()]);
    }
    table
}

pub fn roles_table(roles: &[RoleRow]) -> Table {
    let mut table = base_table(vec!["ID", "Title", "Salary", "Department"]);
    for r in roles {
        table.add_row(vec![
            r.id.to_string(),
            r.title.clone(),
            r.salary.to_string(),
            r.department_name.clone(),
        ]);
    }
    table
}

pub fn employees_table(employees: &[EmployeeRow]) -> Table {
    let mut table = base_table(vec![
        "ID",
        "First Name",
        "Last Name",
        "Title",
        "Department",
        "Manager",
    ]);
    for e in employees {
        table.add_row(vec![
            e.id.to_string(),
            e.first_name.clone(),
            e.last_name.clone(),
            e.title.clone(),
            e.department_name.clone(),
            e.manager_name.clone().unwrap_or_default(),
        ]);
    }
    table
}

pub fn budget_table(budget: &DepartmentBudget) -> Table {
    let mut table = base_table(vec!["Department", "Total Utilized Budget"]);
    table.add_row(vec![
        budget.department_name.clone(),
        budget.total_budget.to_string(),
    ]);
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Decimal;

    #[test]
    fn departments_table_renders_rows() {
        let rows = vec![
            Department {
                id: 1,
                name: "Engineering".to_string(),
            },
            Department {
                id: 2,
                name: "Sales".to_string(),
            },
        ];
        let rendered = departments_table(&rows).to_string();
        assert!(rendered.contains("Name"));
        assert!(rendered.contains("Engineering"));
        assert!(rendered.contains("Sales"));
    }

    #[test]
    fn empty_table_still_has_header() {
        let rendered = departments_table(&[]).to_string();
        assert!(rendered.contains("ID"));
        assert!(rendered.contains("Name"));
    }

    #[test]
    fn employees_table_blanks_absent_manager() {
        let rows = vec![EmployeeRow {
            id: 1,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            title: "Engineer".to_string(),
            department_name: "Engineering".to_string(),
            manager_name: None,
        }];
        let rendered = employees_table(&rows).to_string();
        assert!(rendered.contains("Ada"));
        assert!(rendered.contains("Lovelace"));
        assert!(rendered.contains("Manager"));
    }

    #[test]
    fn budget_table_shows_total() {
        let budget = DepartmentBudget {
            department_name: "Engineering".to_string(),
            total_budget: Decimal::from(100_000),
        };
        let rendered = budget_table(&budget).to_string();
        assert!(rendered.contains("Engineering"));
        assert!(rendered.contains("100000"));
    }
}
