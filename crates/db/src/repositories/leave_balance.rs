//! Leave usage ledger.
//!
//! Usage is recorded once per approved leave request. Recording is keyed on
//! the request ID so replayed approval events are harmless.

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set, sea_query::OnConflict,
};
use uuid::Uuid;

use hrflow_core::requests::LeaveRequest;

use crate::entities::leave_balances;

/// Leave balance repository.
#[derive(Debug, Clone)]
pub struct LeaveBalanceRepository {
    db: DatabaseConnection,
}

impl LeaveBalanceRepository {
    /// Creates a new leave balance repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records the days taken by an approved leave request.
    ///
    /// Returns `false` if usage for this request was already recorded or the
    /// leave type does not draw from a balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub async fn record_usage(
        &self,
        request: &LeaveRequest,
        recorded_at: DateTime<Utc>,
    ) -> Result<bool, DbErr> {
        if !request.leave_type.consumes_balance() {
            return Ok(false);
        }

        let entry = leave_balances::ActiveModel {
            id: Set(Uuid::now_v7()),
            employee_id: Set(request.applicant_id.clone()),
            leave_type: Set(request.leave_type.as_str().to_string()),
            year: Set(request.start_date.year()),
            days_used: Set(request.days),
            request_id: Set(request.id.into_inner()),
            recorded_at: Set(recorded_at.into()),
        };

        let rows = leave_balances::Entity::insert(entry)
            .on_conflict(
                OnConflict::column(leave_balances::Column::RequestId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(rows == 1)
    }

    /// Total days used by an employee in a year, per leave type when given.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn used_days(
        &self,
        employee_id: &str,
        year: i32,
        leave_type: Option<&str>,
    ) -> Result<Decimal, DbErr> {
        let mut query = leave_balances::Entity::find()
            .filter(leave_balances::Column::EmployeeId.eq(employee_id))
            .filter(leave_balances::Column::Year.eq(year));
        if let Some(kind) = leave_type {
            query = query.filter(leave_balances::Column::LeaveType.eq(kind));
        }

        let rows = query.all(&self.db).await?;
        Ok(rows.iter().map(|r| r.days_used).sum())
    }
}
