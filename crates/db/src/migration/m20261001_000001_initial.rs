//! Initial database migration.
//!
//! Creates the employee directory, approval flow configuration, the three
//! approvable request tables and the leave usage ledger.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: DIRECTORY
        // ============================================================
        db.execute_unprepared(EMPLOYEES_SQL).await?;
        db.execute_unprepared(REPORTING_LINES_SQL).await?;

        // ============================================================
        // PART 2: FLOW CONFIGURATION
        // ============================================================
        db.execute_unprepared(APPROVAL_FLOWS_SQL).await?;

        // ============================================================
        // PART 3: APPROVABLE REQUESTS
        // ============================================================
        db.execute_unprepared(LEAVE_REQUESTS_SQL).await?;
        db.execute_unprepared(PROJECT_ASSIGNMENTS_SQL).await?;
        db.execute_unprepared(TASK_ASSIGNMENTS_SQL).await?;

        // ============================================================
        // PART 4: LEAVE USAGE
        // ============================================================
        db.execute_unprepared(LEAVE_BALANCES_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const EMPLOYEES_SQL: &str = r"
CREATE TABLE employees (
    employee_id VARCHAR(32) PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    email VARCHAR(255),
    role VARCHAR(64) NOT NULL,
    department VARCHAR(128),
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Fallback approver lookup: active holders of a role, lowest code first
CREATE INDEX idx_employees_role_active ON employees(lower(role), employee_id) WHERE is_active;
";

const REPORTING_LINES_SQL: &str = r"
CREATE TABLE reporting_lines (
    employee_id VARCHAR(32) PRIMARY KEY REFERENCES employees(employee_id) ON DELETE CASCADE,
    manager_id VARCHAR(32) NOT NULL REFERENCES employees(employee_id) ON DELETE CASCADE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_not_own_manager CHECK (employee_id <> manager_id)
);

CREATE INDEX idx_reporting_lines_manager ON reporting_lines(manager_id);
";

const APPROVAL_FLOWS_SQL: &str = r"
CREATE TABLE approval_flows (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    request_type VARCHAR(64) NOT NULL,
    display_name VARCHAR(128) NOT NULL,
    steps JSONB NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_approval_flows_key UNIQUE (request_type, display_name),
    CONSTRAINT chk_steps_array CHECK (jsonb_typeof(steps) = 'array')
);
";

const LEAVE_REQUESTS_SQL: &str = r"
CREATE TABLE leave_requests (
    id UUID PRIMARY KEY,
    applicant_id VARCHAR(32) NOT NULL REFERENCES employees(employee_id),
    flow_id UUID NOT NULL REFERENCES approval_flows(id),
    leave_type VARCHAR(32) NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    days NUMERIC(5, 1) NOT NULL,
    reason TEXT NOT NULL DEFAULT '',
    approval_trail JSONB NOT NULL DEFAULT '[]',
    overall_state VARCHAR(16) NOT NULL,
    overall_role VARCHAR(64),
    version INTEGER NOT NULL DEFAULT 1,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_leave_dates CHECK (end_date >= start_date),
    CONSTRAINT chk_leave_days CHECK (days > 0),
    CONSTRAINT chk_leave_state CHECK (overall_state IN ('pending', 'approved', 'rejected'))
);

CREATE INDEX idx_leave_requests_applicant ON leave_requests(applicant_id, created_at DESC);
-- Inbox lookups: approval_trail @> '[{employee_id, status: pending}]'
CREATE INDEX idx_leave_requests_trail ON leave_requests USING GIN (approval_trail jsonb_path_ops);
";

const PROJECT_ASSIGNMENTS_SQL: &str = r"
CREATE TABLE project_assignments (
    id UUID PRIMARY KEY,
    applicant_id VARCHAR(32) NOT NULL REFERENCES employees(employee_id),
    flow_id UUID NOT NULL REFERENCES approval_flows(id),
    project_name VARCHAR(255) NOT NULL,
    assignee_id VARCHAR(32) NOT NULL REFERENCES employees(employee_id),
    description TEXT NOT NULL DEFAULT '',
    approval_trail JSONB NOT NULL DEFAULT '[]',
    overall_state VARCHAR(16) NOT NULL,
    overall_role VARCHAR(64),
    version INTEGER NOT NULL DEFAULT 1,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_project_state CHECK (overall_state IN ('pending', 'approved', 'rejected'))
);

CREATE INDEX idx_project_assignments_applicant ON project_assignments(applicant_id, created_at DESC);
CREATE INDEX idx_project_assignments_trail ON project_assignments USING GIN (approval_trail jsonb_path_ops);
";

const TASK_ASSIGNMENTS_SQL: &str = r"
CREATE TABLE task_assignments (
    id UUID PRIMARY KEY,
    applicant_id VARCHAR(32) NOT NULL REFERENCES employees(employee_id),
    flow_id UUID NOT NULL REFERENCES approval_flows(id),
    title VARCHAR(255) NOT NULL,
    assignee_id VARCHAR(32) NOT NULL REFERENCES employees(employee_id),
    project_id UUID REFERENCES project_assignments(id) ON DELETE SET NULL,
    due_date DATE,
    approval_trail JSONB NOT NULL DEFAULT '[]',
    overall_state VARCHAR(16) NOT NULL,
    overall_role VARCHAR(64),
    version INTEGER NOT NULL DEFAULT 1,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_task_state CHECK (overall_state IN ('pending', 'approved', 'rejected'))
);

CREATE INDEX idx_task_assignments_applicant ON task_assignments(applicant_id, created_at DESC);
CREATE INDEX idx_task_assignments_trail ON task_assignments USING GIN (approval_trail jsonb_path_ops);
";

const LEAVE_BALANCES_SQL: &str = r"
CREATE TABLE leave_balances (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    employee_id VARCHAR(32) NOT NULL REFERENCES employees(employee_id),
    leave_type VARCHAR(32) NOT NULL,
    year INTEGER NOT NULL,
    days_used NUMERIC(5, 1) NOT NULL,
    request_id UUID NOT NULL UNIQUE REFERENCES leave_requests(id) ON DELETE CASCADE,
    recorded_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_days_used CHECK (days_used > 0)
);

CREATE INDEX idx_leave_balances_employee ON leave_balances(employee_id, year, leave_type);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS leave_balances CASCADE;
DROP TABLE IF EXISTS task_assignments CASCADE;
DROP TABLE IF EXISTS project_assignments CASCADE;
DROP TABLE IF EXISTS leave_requests CASCADE;
DROP TABLE IF EXISTS approval_flows CASCADE;
DROP TABLE IF EXISTS reporting_lines CASCADE;
DROP TABLE IF EXISTS employees CASCADE;
";
