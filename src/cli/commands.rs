use crate::cli::{
    budget_table, confirm, departments_table, employees_table, input_salary, input_text,
    roles_table, ChoiceList,
};
use crate::db::{Database, SEED_SCRIPT};
use crate::error::{AppError, Result};
use crate::models::{Department, EmployeeRow, RoleRow};
use colored::*;
use dialoguer::{theme::ColorfulTheme, Select};
use std::env;
use tracing::{error, info};

/// One action reachable from the main menu. The menu loop selects exactly one
/// variant per iteration and returns to the menu when it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    ViewDepartments,
    ViewRoles,
    ViewEmployees,
    ViewDepartmentBudget,
    AddDepartment,
    AddRole,
    AddEmployee,
    UpdateEmployeeRole,
    Delete,
    ImportSeeds,
    Exit,
}

impl MenuAction {
    /// All actions in menu order.
    pub const ALL: [MenuAction; 11] = [
        MenuAction::ViewDepartments,
        MenuAction::ViewRoles,
        MenuAction::ViewEmployees,
        MenuAction::ViewDepartmentBudget,
        MenuAction::AddDepartment,
        MenuAction::AddRole,
        MenuAction::AddEmployee,
        MenuAction::UpdateEmployeeRole,
        MenuAction::Delete,
        MenuAction::ImportSeeds,
        MenuAction::Exit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MenuAction::ViewDepartments => "View all departments",
            MenuAction::ViewRoles => "View all roles",
            MenuAction::ViewEmployees => "View all employees",
            MenuAction::ViewDepartmentBudget => "View the total utilized budget of a department",
            MenuAction::AddDepartment => "Add a department",
            MenuAction::AddRole => "Add a role",
            MenuAction::AddEmployee => "Add an employee",
            MenuAction::UpdateEmployeeRole => "Update an employee role",
            MenuAction::Delete => "Delete a record",
            MenuAction::ImportSeeds => "Import sample data",
            MenuAction::Exit => "Exit",
        }
    }
}

/// The entity kinds offered by the delete sub-menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteTarget {
    Department,
    Role,
    Employee,
}

impl DeleteTarget {
    pub const ALL: [DeleteTarget; 3] = [
        DeleteTarget::Department,
        DeleteTarget::Role,
        DeleteTarget::Employee,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DeleteTarget::Department => "Department",
            DeleteTarget::Role => "Role",
            DeleteTarget::Employee => "Employee",
        }
    }
}

// --- Choice-list builders ---
// Pure projections from fetched rows to label -> id mappings, so the prompt
// layer never accepts a free-form identifier for a relational field.

pub fn department_choices(departments: &[Department]) -> ChoiceList {
    ChoiceList::new(departments.iter().map(|d| (d.name.clone(), d.id)))
}

pub fn role_choices(roles: &[RoleRow]) -> ChoiceList {
    ChoiceList::new(
        roles
            .iter()
            .map(|r| (format!("{} ({})", r.title, r.department_name), r.id)),
    )
}

pub fn employee_choices(employees: &[EmployeeRow]) -> ChoiceList {
    ChoiceList::new(employees.iter().map(|e| (e.full_name(), e.id)))
}

/// CLI application: owns the database handle and dispatches menu actions.
pub struct App {
    db: Database,
}

impl App {
    /// Create a new CLI application.
    ///
    /// Loads environment configuration, connects the pool and ensures the
    /// schema exists. A failure here is fatal to startup.
    pub async fn new() -> Result<Self> {
        // Load environment variables
        dotenv::dotenv().ok();

        let database_url = env::var("DATABASE_URL").map_err(|e| {
            error!("DATABASE_URL environment variable not set: {}", e);
            AppError::Env(e)
        })?;

        let db = Database::new(&database_url).await?;
        if !db.is_schema_initialized().await? {
            db.init_schema().await?;
        }

        Ok(Self { db })
    }

    /// Runs one menu action to completion. `Exit` is handled by the caller's
    /// loop and is a no-op here.
    pub async fn run_action(&self, action: MenuAction) -> Result<()> {
        info!("Running menu action: {:?}", action);
        match action {
            MenuAction::ViewDepartments => self.view_departments().await,
            MenuAction::ViewRoles => self.view_roles().await,
            MenuAction::ViewEmployees => self.view_employees().await,
            MenuAction::ViewDepartmentBudget => self.view_department_budget().await,
            MenuAction::AddDepartment => self.add_department().await,
            MenuAction::AddRole => self.add_role().await,
            MenuAction::AddEmployee => self.add_employee().await,
            MenuAction::UpdateEmployeeRole => self.update_employee_role().await,
            MenuAction::Delete => self.delete_record().await,
            MenuAction::ImportSeeds => self.import_seeds().await,
            MenuAction::Exit => Ok(()),
        }
    }

    async fn view_departments(&self) -> Result<()> {
        let departments = self.db.list_departments().await?;
        println!("{}", departments_table(&departments));
        if departments.is_empty() {
            println!("{}", "No departments yet.".dimmed());
        }
        Ok(())
    }

    async fn view_roles(&self) -> Result<()> {
        let roles = self.db.list_roles().await?;
        println!("{}", roles_table(&roles));
        if roles.is_empty() {
            println!("{}", "No roles yet.".dimmed());
        }
        Ok(())
    }

    async fn view_employees(&self) -> Result<()> {
        let employees = self.db.list_employees().await?;
        println!("{}", employees_table(&employees));
        if employees.is_empty() {
            println!("{}", "No employees yet.".dimmed());
        }
        Ok(())
    }

    async fn view_department_budget(&self) -> Result<()> {
        let departments = self.db.list_departments().await?;
        if departments.is_empty() {
            return Err(AppError::Cli(
                "No departments yet; add a department first".to_string(),
            ));
        }
        let department_id = department_choices(&departments).select("Select a department")?;
        let budget = self.db.department_budget(department_id).await?;
        println!("{}", budget_table(&budget));
        Ok(())
    }

    async fn add_department(&self) -> Result<()> {
        let name = input_text("Enter the name of the department")?;
        self.db.add_department(&name).await?;
        println!("{}", "Department added successfully!".green());
        Ok(())
    }

    async fn add_role(&self) -> Result<()> {
        let departments = self.db.list_departments().await?;
        if departments.is_empty() {
            return Err(AppError::Cli(
                "No departments yet; add a department first".to_string(),
            ));
        }

        let title = input_text("Enter the title of the role")?;
        let salary = input_salary("Enter the salary of the role")?;
        let department_id =
            department_choices(&departments).select("Select the department for the role")?;

        self.db.add_role(&title, salary, department_id).await?;
        println!("{}", "Role added successfully!".green());
        Ok(())
    }

    async fn add_employee(&self) -> Result<()> {
        let roles = self.db.list_roles().await?;
        if roles.is_empty() {
            return Err(AppError::Cli(
                "No roles yet; add a role first".to_string(),
            ));
        }

        let first_name = input_text("Enter the first name of the employee")?;
        let last_name = input_text("Enter the last name of the employee")?;
        let role_id = role_choices(&roles).select("Select the role for the employee")?;

        // Manager selection is conditional: only fetch and present the roster
        // when the user confirms the employee has one.
        let manager_id = if confirm("Does this employee have a manager?")? {
            let employees = self.db.list_employees().await?;
            if employees.is_empty() {
                return Err(AppError::Cli(
                    "No employees yet to pick a manager from".to_string(),
                ));
            }
            Some(employee_choices(&employees).fuzzy_select("Select the manager")?)
        } else {
            None
        };

        self.db
            .add_employee(&first_name, &last_name, role_id, manager_id)
            .await?;
        println!("{}", "Employee added successfully!".green());
        Ok(())
    }

    async fn update_employee_role(&self) -> Result<()> {
        let employees = self.db.list_employees().await?;
        if employees.is_empty() {
            return Err(AppError::Cli(
                "No employees yet; add an employee first".to_string(),
            ));
        }
        let roles = self.db.list_roles().await?;
        if roles.is_empty() {
            return Err(AppError::Cli(
                "No roles yet; add a role first".to_string(),
            ));
        }

        let employee_id =
            employee_choices(&employees).fuzzy_select("Select the employee to update")?;
        let role_id = role_choices(&roles).select("Select the new role")?;

        self.db.update_employee_role(employee_id, role_id).await?;
        println!("{}", "Employee role updated successfully!".green());
        Ok(())
    }

    async fn delete_record(&self) -> Result<()> {
        let index = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("What would you like to delete?")
            .items(&DeleteTarget::ALL.map(|t| t.label()))
            .default(0)
            .interact()?;

        match DeleteTarget::ALL[index] {
            DeleteTarget::Department => {
                let departments = self.db.list_departments().await?;
                if departments.is_empty() {
                    return Err(AppError::Cli("No departments to delete".to_string()));
                }
                let id =
                    department_choices(&departments).select("Select the department to delete")?;
                self.db.delete_department(id).await?;
                println!("{}", "Department deleted successfully!".green());
            },
            DeleteTarget::Role => {
                let roles = self.db.list_roles().await?;
                if roles.is_empty() {
                    return Err(AppError::Cli("No roles to delete".to_string()));
                }
                let id = role_choices(&roles).select("Select the role to delete")?;
                self.db.delete_role(id).await?;
                println!("{}", "Role deleted successfully!".green());
            },
            DeleteTarget::Employee => {
                let employees = self.db.list_employees().await?;
                if employees.is_empty() {
                    return Err(AppError::Cli("No employees to delete".to_string()));
                }
                let id =
                    employee_choices(&employees).fuzzy_select("Select the employee to delete")?;
                self.db.delete_employee(id).await?;
                println!("{}", "Employee deleted successfully!".green());
            },
        }
        Ok(())
    }

    async fn import_seeds(&self) -> Result<()> {
        self.db.import_seed_script(SEED_SCRIPT).await?;
        println!("{}", "Sample data imported successfully!".green());
        Ok(())
    }
}
