// libs/client-cell/src/services/directory.rs
use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_database::SupabaseClient;

use crate::models::{Client, ClientError, ClientStats, CreateClientRequest, UpdateClientRequest};

pub struct ClientDirectoryService {
    store: Arc<SupabaseClient>,
}

impl ClientDirectoryService {
    pub fn new(store: Arc<SupabaseClient>) -> Self {
        Self { store }
    }

    pub async fn list_clients(&self, auth_token: &str) -> Result<Vec<Client>, ClientError> {
        debug!("Listing clients");

        let rows = self
            .store
            .select(
                "/rest/v1/users?role=eq.client&select=id,email,first_name,last_name,phone,created_at,updated_at&order=created_at.desc",
                Some(auth_token),
            )
            .await
            .map_err(|e| ClientError::DatabaseError(e.to_string()))?;

        parse_clients(rows)
    }

    pub async fn get_client(&self, client_id: Uuid, auth_token: &str) -> Result<Client, ClientError> {
        debug!("Fetching client: {}", client_id);

        let path = format!(
            "/rest/v1/users?id=eq.{}&role=eq.client&select=id,email,first_name,last_name,phone,created_at,updated_at",
            client_id
        );
        let rows = self
            .store
            .select(&path, Some(auth_token))
            .await
            .map_err(|e| ClientError::DatabaseError(e.to_string()))?;

        let row = rows.into_iter().next().ok_or(ClientError::NotFound)?;
        serde_json::from_value(row)
            .map_err(|e| ClientError::DatabaseError(format!("Failed to parse client: {}", e)))
    }

    pub async fn create_client(
        &self,
        request: CreateClientRequest,
        auth_token: &str,
    ) -> Result<Client, ClientError> {
        let email = request.email.trim().to_lowercase();
        debug!("Creating client profile for: {}", email);

        if email.is_empty() || request.first_name.trim().is_empty() || request.last_name.trim().is_empty() {
            return Err(ClientError::ValidationError(
                "Email, first name and last name are required".to_string(),
            ));
        }

        self.ensure_email_free(&email, None, auth_token).await?;

        let body = json!({
            "email": email,
            "first_name": request.first_name,
            "last_name": request.last_name,
            "phone": request.phone,
            "role": "client",
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let rows = self
            .store
            .insert_returning("/rest/v1/users", body, Some(auth_token))
            .await
            .map_err(|e| ClientError::DatabaseError(e.to_string()))?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::DatabaseError("Failed to create client".to_string()))?;
        serde_json::from_value(row)
            .map_err(|e| ClientError::DatabaseError(format!("Failed to parse client: {}", e)))
    }

    pub async fn update_client(
        &self,
        client_id: Uuid,
        request: UpdateClientRequest,
        auth_token: &str,
    ) -> Result<Client, ClientError> {
        debug!("Updating client: {}", client_id);

        let existing = self.get_client(client_id, auth_token).await?;

        let mut update_data = serde_json::Map::new();

        if let Some(email) = request.email {
            let email = email.trim().to_lowercase();
            if email != existing.email {
                self.ensure_email_free(&email, Some(client_id), auth_token).await?;
            }
            update_data.insert("email".to_string(), json!(email));
        }
        if let Some(first_name) = request.first_name {
            update_data.insert("first_name".to_string(), json!(first_name));
        }
        if let Some(last_name) = request.last_name {
            update_data.insert("last_name".to_string(), json!(last_name));
        }
        if let Some(phone) = request.phone {
            update_data.insert("phone".to_string(), json!(phone));
        }

        if update_data.is_empty() {
            return Err(ClientError::ValidationError("No fields to update".to_string()));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/users?id=eq.{}&role=eq.client", client_id);
        let rows = self
            .store
            .update_returning(&path, Value::Object(update_data), Some(auth_token))
            .await
            .map_err(|e| ClientError::DatabaseError(e.to_string()))?;

        let row = rows.into_iter().next().ok_or(ClientError::NotFound)?;
        serde_json::from_value(row)
            .map_err(|e| ClientError::DatabaseError(format!("Failed to parse client: {}", e)))
    }

    /// Deleting a client is refused while scheduled appointments remain, so
    /// masters never lose a booked visit to a directory cleanup.
    pub async fn delete_client(&self, client_id: Uuid, auth_token: &str) -> Result<(), ClientError> {
        debug!("Deleting client: {}", client_id);

        self.get_client(client_id, auth_token).await?;

        let active_path = format!(
            "/rest/v1/appointments?client_id=eq.{}&status=eq.scheduled&select=id",
            client_id
        );
        let active = self
            .store
            .select(&active_path, Some(auth_token))
            .await
            .map_err(|e| ClientError::DatabaseError(e.to_string()))?;

        if !active.is_empty() {
            return Err(ClientError::HasActiveAppointments);
        }

        let path = format!("/rest/v1/users?id=eq.{}&role=eq.client", client_id);
        self.store
            .delete(&path, Some(auth_token))
            .await
            .map_err(|e| ClientError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    /// Lifetime booking counters for the client dashboard, computed from the
    /// client's own appointment rows.
    pub async fn get_client_stats(&self, client_id: Uuid, auth_token: &str) -> Result<ClientStats, ClientError> {
        debug!("Computing stats for client: {}", client_id);

        let path = format!(
            "/rest/v1/appointments?client_id=eq.{}&select=status,total_price",
            client_id
        );
        let rows = self
            .store
            .select(&path, Some(auth_token))
            .await
            .map_err(|e| ClientError::DatabaseError(e.to_string()))?;

        let mut stats = ClientStats {
            total_appointments: rows.len() as i64,
            completed_appointments: 0,
            scheduled_appointments: 0,
            cancelled_appointments: 0,
            total_spent: 0.0,
        };

        for row in rows {
            match row.get("status").and_then(Value::as_str) {
                Some("completed") => {
                    stats.completed_appointments += 1;
                    stats.total_spent += row.get("total_price").and_then(Value::as_f64).unwrap_or(0.0);
                }
                Some("scheduled") => stats.scheduled_appointments += 1,
                Some("cancelled") => stats.cancelled_appointments += 1,
                _ => {}
            }
        }

        Ok(stats)
    }

    async fn ensure_email_free(
        &self,
        email: &str,
        exclude_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<(), ClientError> {
        let mut path = format!("/rest/v1/users?email=eq.{}&select=id", email);
        if let Some(id) = exclude_id {
            path.push_str(&format!("&id=neq.{}", id));
        }

        let rows = self
            .store
            .select(&path, Some(auth_token))
            .await
            .map_err(|e| ClientError::DatabaseError(e.to_string()))?;

        if rows.is_empty() {
            Ok(())
        } else {
            Err(ClientError::EmailTaken)
        }
    }
}

fn parse_clients(rows: Vec<Value>) -> Result<Vec<Client>, ClientError> {
    rows.into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<Client>, _>>()
        .map_err(|e| ClientError::DatabaseError(format!("Failed to parse clients: {}", e)))
}
