//! Employee directory repository.

use sea_orm::{
    AccessMode, ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, IsolationLevel,
    QueryOrder, Set, TransactionTrait, sea_query::OnConflict,
};

use hrflow_core::approval::{DirectorySnapshot, Employee};

use crate::entities::{employees, reporting_lines};

/// Input for creating an employee.
#[derive(Debug, Clone)]
pub struct CreateEmployeeInput {
    /// Employee code, e.g. `EMP0001`.
    pub employee_id: String,
    /// Display name.
    pub name: String,
    /// Work email.
    pub email: Option<String>,
    /// Organisational role.
    pub role: String,
    /// Department.
    pub department: Option<String>,
}

/// Employee repository.
#[derive(Debug, Clone)]
pub struct EmployeeRepository {
    db: DatabaseConnection,
}

impl EmployeeRepository {
    /// Creates a new employee repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds an employee by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(&self, employee_id: &str) -> Result<Option<employees::Model>, DbErr> {
        employees::Entity::find_by_id(employee_id.to_string())
            .one(&self.db)
            .await
    }

    /// Creates an employee or refreshes an existing one with the same code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub async fn upsert(&self, input: CreateEmployeeInput) -> Result<(), DbErr> {
        let now = chrono::Utc::now().into();
        let employee = employees::ActiveModel {
            employee_id: Set(input.employee_id),
            name: Set(input.name),
            email: Set(input.email),
            role: Set(input.role),
            department: Set(input.department),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        employees::Entity::insert(employee)
            .on_conflict(
                OnConflict::column(employees::Column::EmployeeId)
                    .update_columns([
                        employees::Column::Name,
                        employees::Column::Email,
                        employees::Column::Role,
                        employees::Column::Department,
                        employees::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    /// Activates or deactivates an employee.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn set_active(&self, employee_id: &str, is_active: bool) -> Result<(), DbErr> {
        employees::ActiveModel {
            employee_id: Set(employee_id.to_string()),
            is_active: Set(is_active),
            updated_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        }
        .update(&self.db)
        .await?;
        Ok(())
    }

    /// Sets who `employee_id` reports to, replacing any previous line.
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub async fn set_manager(&self, employee_id: &str, manager_id: &str) -> Result<(), DbErr> {
        let line = reporting_lines::ActiveModel {
            employee_id: Set(employee_id.to_string()),
            manager_id: Set(manager_id.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };

        reporting_lines::Entity::insert(line)
            .on_conflict(
                OnConflict::column(reporting_lines::Column::EmployeeId)
                    .update_column(reporting_lines::Column::ManagerId)
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    /// Loads the whole directory and reporting chain.
    ///
    /// Both tables are read in one REPEATABLE READ, read-only transaction so
    /// the snapshot never mixes two versions of the org chart.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn load_directory_snapshot(&self) -> Result<DirectorySnapshot, DbErr> {
        let txn = self
            .db
            .begin_with_config(
                Some(IsolationLevel::RepeatableRead),
                Some(AccessMode::ReadOnly),
            )
            .await?;

        let employees = employees::Entity::find()
            .order_by_asc(employees::Column::EmployeeId)
            .all(&txn)
            .await?;
        let lines = reporting_lines::Entity::find().all(&txn).await?;

        txn.commit().await?;

        Ok(DirectorySnapshot::new(
            employees.into_iter().map(to_core),
            lines.into_iter().map(|l| (l.employee_id, l.manager_id)),
        ))
    }
}

/// Converts an employee row to the core model.
#[must_use]
pub fn to_core(model: employees::Model) -> Employee {
    Employee {
        employee_id: model.employee_id,
        name: model.name,
        role: model.role,
        department: model.department,
        email: model.email,
        is_active: model.is_active,
    }
}
