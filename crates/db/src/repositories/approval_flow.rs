//! Approval flow configuration repository.
//!
//! Flows are keyed by `(request_type, display_name)`. Reads go through a
//! moka cache that is cleared on every write, so request processing sees a
//! new definition as soon as it is stored.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr, sea_query::OnConflict,
};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use hrflow_core::approval::{ApprovalError, ApprovalFlow, FlowStep, FlowValidator};

use crate::entities::approval_flows;

/// Default cache capacity (number of cached lookups).
const DEFAULT_CACHE_CAPACITY: u64 = 256;

/// Errors that can occur during approval flow operations.
#[derive(Debug, Error)]
pub enum ApprovalFlowError {
    /// Approval flow not found.
    #[error("Approval flow {0} not found")]
    NotFound(Uuid),

    /// A flow with the same key already exists.
    #[error("Approval flow for {request_type} ({display_name}) already exists")]
    AlreadyExists {
        /// Request type of the conflicting flow.
        request_type: String,
        /// Display name of the conflicting flow.
        display_name: String,
    },

    /// The definition failed validation.
    #[error(transparent)]
    Invalid(#[from] ApprovalError),

    /// Requests still reference the flow.
    #[error("Approval flow {0} is still referenced by requests")]
    InUse(Uuid),

    /// Stored steps could not be decoded.
    #[error("Approval flow {0} has malformed steps")]
    Malformed(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ApprovalFlowError> for ApprovalError {
    fn from(err: ApprovalFlowError) -> Self {
        match err {
            ApprovalFlowError::Invalid(inner) => inner,
            ApprovalFlowError::NotFound(id) => Self::FlowNotFound {
                request_type: "any".to_string(),
                display_name: id.to_string(),
            },
            other => Self::Database(other.to_string()),
        }
    }
}

/// Input for creating or upserting a flow.
#[derive(Debug, Clone)]
pub struct CreateFlowInput {
    /// Request type key, e.g. `Leave`.
    pub request_type: String,
    /// Display name, e.g. `Leave Request`.
    pub display_name: String,
    /// Steps in approval order.
    pub steps: Vec<FlowStep>,
}

/// Input for updating a flow. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct UpdateFlowInput {
    /// New display name.
    pub display_name: Option<String>,
    /// New steps.
    pub steps: Option<Vec<FlowStep>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum FlowKey {
    Id(Uuid),
    Lookup {
        request_type: String,
        display_name: Option<String>,
    },
}

/// Repository for approval flow definitions.
#[derive(Clone)]
pub struct ApprovalFlowRepository {
    db: DatabaseConnection,
    cache: Cache<FlowKey, Arc<ApprovalFlow>>,
}

impl ApprovalFlowRepository {
    /// Creates a repository whose cached lookups live for `ttl_secs`.
    #[must_use]
    pub fn new(db: DatabaseConnection, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(DEFAULT_CACHE_CAPACITY)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();
        Self { db, cache }
    }

    /// Creates a new flow.
    ///
    /// # Errors
    ///
    /// - `Invalid` if the definition fails validation
    /// - `AlreadyExists` if a flow with the same key exists
    pub async fn create(&self, input: CreateFlowInput) -> Result<ApprovalFlow, ApprovalFlowError> {
        FlowValidator::validate(&input.request_type, &input.display_name, &input.steps)?;

        let now = chrono::Utc::now().into();
        let flow = approval_flows::ActiveModel {
            id: Set(Uuid::now_v7()),
            request_type: Set(input.request_type.clone()),
            display_name: Set(input.display_name.clone()),
            steps: Set(steps_to_json(&input.steps)?),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = match flow.insert(&self.db).await {
            Ok(model) => model,
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                return Err(ApprovalFlowError::AlreadyExists {
                    request_type: input.request_type,
                    display_name: input.display_name,
                });
            }
            Err(e) => return Err(e.into()),
        };

        self.cache.invalidate_all();
        to_core(model)
    }

    /// Creates the flow or replaces the steps of the existing one with the
    /// same key.
    ///
    /// # Errors
    ///
    /// Returns an error if validation or the database write fails.
    pub async fn upsert(&self, input: CreateFlowInput) -> Result<ApprovalFlow, ApprovalFlowError> {
        FlowValidator::validate(&input.request_type, &input.display_name, &input.steps)?;

        let now = chrono::Utc::now().into();
        let flow = approval_flows::ActiveModel {
            id: Set(Uuid::now_v7()),
            request_type: Set(input.request_type.clone()),
            display_name: Set(input.display_name.clone()),
            steps: Set(steps_to_json(&input.steps)?),
            created_at: Set(now),
            updated_at: Set(now),
        };

        approval_flows::Entity::insert(flow)
            .on_conflict(
                OnConflict::columns([
                    approval_flows::Column::RequestType,
                    approval_flows::Column::DisplayName,
                ])
                .update_columns([
                    approval_flows::Column::Steps,
                    approval_flows::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        self.cache.invalidate_all();

        let model = approval_flows::Entity::find()
            .filter(approval_flows::Column::RequestType.eq(&input.request_type))
            .filter(approval_flows::Column::DisplayName.eq(&input.display_name))
            .one(&self.db)
            .await?
            .ok_or_else(|| {
                ApprovalFlowError::Database(DbErr::RecordNotFound(input.display_name.clone()))
            })?;
        to_core(model)
    }

    /// Updates a flow by ID.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the flow does not exist
    /// - `Invalid` if the merged definition fails validation
    /// - `AlreadyExists` if the new display name collides with another flow
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateFlowInput,
    ) -> Result<ApprovalFlow, ApprovalFlowError> {
        let existing = approval_flows::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(ApprovalFlowError::NotFound(id))?;
        let current = to_core(existing.clone())?;

        let display_name = input.display_name.unwrap_or(current.display_name);
        let steps = input.steps.unwrap_or(current.steps);
        FlowValidator::validate(&current.request_type, &display_name, &steps)?;

        let mut active: approval_flows::ActiveModel = existing.into();
        active.display_name = Set(display_name.clone());
        active.steps = Set(steps_to_json(&steps)?);
        active.updated_at = Set(chrono::Utc::now().into());

        let model = match active.update(&self.db).await {
            Ok(model) => model,
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                return Err(ApprovalFlowError::AlreadyExists {
                    request_type: current.request_type,
                    display_name,
                });
            }
            Err(e) => return Err(e.into()),
        };

        self.cache.invalidate_all();
        to_core(model)
    }

    /// Deletes a flow by ID.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the flow does not exist
    /// - `InUse` if requests still reference it
    pub async fn delete(&self, id: Uuid) -> Result<(), ApprovalFlowError> {
        let result = match approval_flows::Entity::delete_by_id(id).exec(&self.db).await {
            Ok(result) => result,
            Err(e) if matches!(e.sql_err(), Some(SqlErr::ForeignKeyConstraintViolation(_))) => {
                return Err(ApprovalFlowError::InUse(id));
            }
            Err(e) => return Err(e.into()),
        };
        if result.rows_affected == 0 {
            return Err(ApprovalFlowError::NotFound(id));
        }
        self.cache.invalidate_all();
        Ok(())
    }

    /// Lists flows, optionally filtered by display name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or a row is malformed.
    pub async fn list(
        &self,
        display_name: Option<&str>,
    ) -> Result<Vec<ApprovalFlow>, ApprovalFlowError> {
        let mut query = approval_flows::Entity::find();
        if let Some(name) = display_name {
            query = query.filter(approval_flows::Column::DisplayName.eq(name));
        }

        query
            .order_by_asc(approval_flows::Column::RequestType)
            .order_by_asc(approval_flows::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(to_core)
            .collect()
    }

    /// Finds a flow by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or the row is malformed.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Arc<ApprovalFlow>>, ApprovalFlowError> {
        let key = FlowKey::Id(id);
        if let Some(flow) = self.cache.get(&key).await {
            return Ok(Some(flow));
        }

        let Some(model) = approval_flows::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };
        let flow = Arc::new(to_core(model)?);
        self.cache.insert(key, Arc::clone(&flow)).await;
        Ok(Some(flow))
    }

    /// Finds the flow for a request type.
    ///
    /// Without a display name the oldest flow for the request type is used.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or the row is malformed.
    pub async fn find_flow(
        &self,
        request_type: &str,
        display_name: Option<&str>,
    ) -> Result<Option<Arc<ApprovalFlow>>, ApprovalFlowError> {
        let key = FlowKey::Lookup {
            request_type: request_type.to_string(),
            display_name: display_name.map(ToString::to_string),
        };
        if let Some(flow) = self.cache.get(&key).await {
            return Ok(Some(flow));
        }

        let mut query = approval_flows::Entity::find()
            .filter(approval_flows::Column::RequestType.eq(request_type));
        if let Some(name) = display_name {
            query = query.filter(approval_flows::Column::DisplayName.eq(name));
        }
        let Some(model) = query
            .order_by_asc(approval_flows::Column::CreatedAt)
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        debug!(request_type, display_name, flow_id = %model.id, "Approval flow loaded");
        let flow = Arc::new(to_core(model)?);
        self.cache.insert(key, Arc::clone(&flow)).await;
        Ok(Some(flow))
    }
}

fn steps_to_json(steps: &[FlowStep]) -> Result<serde_json::Value, ApprovalFlowError> {
    serde_json::to_value(steps).map_err(|e| {
        ApprovalFlowError::Database(DbErr::Custom(format!("failed to encode flow steps: {e}")))
    })
}

fn to_core(model: approval_flows::Model) -> Result<ApprovalFlow, ApprovalFlowError> {
    let steps: Vec<FlowStep> =
        serde_json::from_value(model.steps).map_err(|_| ApprovalFlowError::Malformed(model.id))?;

    Ok(ApprovalFlow {
        id: model.id,
        request_type: model.request_type,
        display_name: model.display_name,
        steps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_json_shape() {
        let mut hr = FlowStep::new("HR", 2);
        hr.department = Some("People".to_string());
        let json = steps_to_json(&[FlowStep::new("Employee", 1), hr]).unwrap();

        assert_eq!(json[0]["role"], "Employee");
        assert_eq!(json[0]["sequence_no"], 1);
        assert!(json[0].get("department").is_none());
        assert_eq!(json[1]["department"], "People");
    }

    #[test]
    fn test_to_core_round_trip() {
        let id = Uuid::now_v7();
        let steps = vec![FlowStep::new("Employee", 1), FlowStep::new("Manager", 2)];
        let now = chrono::Utc::now().into();
        let model = approval_flows::Model {
            id,
            request_type: "Leave".into(),
            display_name: "Leave Request".into(),
            steps: steps_to_json(&steps).unwrap(),
            created_at: now,
            updated_at: now,
        };

        let flow = to_core(model).unwrap();
        assert_eq!(flow.id, id);
        assert_eq!(flow.steps, steps);
    }

    #[test]
    fn test_malformed_steps() {
        let now = chrono::Utc::now().into();
        let model = approval_flows::Model {
            id: Uuid::nil(),
            request_type: "Leave".into(),
            display_name: "Leave Request".into(),
            steps: serde_json::json!({"role": "HR"}),
            created_at: now,
            updated_at: now,
        };
        assert!(matches!(to_core(model), Err(ApprovalFlowError::Malformed(_))));
    }
}
