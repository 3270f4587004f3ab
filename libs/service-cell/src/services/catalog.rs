// libs/service-cell/src/services/catalog.rs
use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_database::SupabaseClient;

use crate::models::{CatalogError, CreateServiceRequest, Service, ServiceMaster, UpdateServiceRequest};

pub struct CatalogService {
    store: Arc<SupabaseClient>,
}

impl CatalogService {
    pub fn new(store: Arc<SupabaseClient>) -> Self {
        Self { store }
    }

    /// Active services, ordered by name, as shown to clients.
    pub async fn list_active_services(&self, auth_token: Option<&str>) -> Result<Vec<Service>, CatalogError> {
        debug!("Listing active services");

        let rows = self
            .store
            .select("/rest/v1/services?is_active=eq.true&order=name.asc", auth_token)
            .await
            .map_err(|e| CatalogError::DatabaseError(e.to_string()))?;

        parse_services(rows)
    }

    /// Every service regardless of is_active, for the admin catalog view.
    pub async fn list_all_services(&self, auth_token: Option<&str>) -> Result<Vec<Service>, CatalogError> {
        debug!("Listing all services for admin");

        let rows = self
            .store
            .select("/rest/v1/services?order=created_at.desc", auth_token)
            .await
            .map_err(|e| CatalogError::DatabaseError(e.to_string()))?;

        parse_services(rows)
    }

    pub async fn get_service(&self, service_id: Uuid, auth_token: Option<&str>) -> Result<Service, CatalogError> {
        debug!("Fetching service: {}", service_id);

        let path = format!("/rest/v1/services?id=eq.{}", service_id);
        let rows = self
            .store
            .select(&path, auth_token)
            .await
            .map_err(|e| CatalogError::DatabaseError(e.to_string()))?;

        let row = rows.into_iter().next().ok_or(CatalogError::NotFound)?;
        serde_json::from_value(row)
            .map_err(|e| CatalogError::DatabaseError(format!("Failed to parse service: {}", e)))
    }

    /// Masters offering the service, via the master_services link table.
    pub async fn get_service_masters(
        &self,
        service_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Vec<ServiceMaster>, CatalogError> {
        debug!("Fetching masters for service: {}", service_id);

        let path = format!(
            "/rest/v1/master_services?service_id=eq.{}&select=master:users!master_services_master_id_fkey(id,first_name,last_name,phone,avatar_url)",
            service_id
        );
        let rows = self
            .store
            .select(&path, auth_token)
            .await
            .map_err(|e| CatalogError::DatabaseError(e.to_string()))?;

        let masters = rows
            .into_iter()
            .filter_map(|row| row.get("master").cloned())
            .map(serde_json::from_value)
            .collect::<Result<Vec<ServiceMaster>, _>>()
            .map_err(|e| CatalogError::DatabaseError(format!("Failed to parse masters: {}", e)))?;

        Ok(masters)
    }

    pub async fn create_service(
        &self,
        request: CreateServiceRequest,
        auth_token: Option<&str>,
    ) -> Result<Service, CatalogError> {
        debug!("Creating service: {}", request.name);

        validate_pricing(request.price, request.duration_minutes)?;
        if request.name.trim().is_empty() {
            return Err(CatalogError::ValidationError("Service name is required".to_string()));
        }

        let body = json!({
            "name": request.name,
            "description": request.description,
            "price": request.price,
            "duration_minutes": request.duration_minutes,
            "is_active": request.is_active.unwrap_or(true),
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let rows = self
            .store
            .insert_returning("/rest/v1/services", body, auth_token)
            .await
            .map_err(|e| CatalogError::DatabaseError(e.to_string()))?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::DatabaseError("Failed to create service".to_string()))?;
        serde_json::from_value(row)
            .map_err(|e| CatalogError::DatabaseError(format!("Failed to parse service: {}", e)))
    }

    pub async fn update_service(
        &self,
        service_id: Uuid,
        request: UpdateServiceRequest,
        auth_token: Option<&str>,
    ) -> Result<Service, CatalogError> {
        debug!("Updating service: {}", service_id);

        // Row must exist before we build the patch
        self.get_service(service_id, auth_token).await?;

        if let Some(price) = request.price {
            if price < 0.0 {
                return Err(CatalogError::ValidationError("Price cannot be negative".to_string()));
            }
        }
        if let Some(duration) = request.duration_minutes {
            if duration < 1 {
                return Err(CatalogError::ValidationError(
                    "Duration must be at least one minute".to_string(),
                ));
            }
        }

        let mut update_data = serde_json::Map::new();
        if let Some(name) = request.name {
            update_data.insert("name".to_string(), json!(name));
        }
        if let Some(description) = request.description {
            update_data.insert("description".to_string(), json!(description));
        }
        if let Some(price) = request.price {
            update_data.insert("price".to_string(), json!(price));
        }
        if let Some(duration) = request.duration_minutes {
            update_data.insert("duration_minutes".to_string(), json!(duration));
        }
        if let Some(is_active) = request.is_active {
            update_data.insert("is_active".to_string(), json!(is_active));
        }

        if update_data.is_empty() {
            return Err(CatalogError::ValidationError("No fields to update".to_string()));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/services?id=eq.{}", service_id);
        let rows = self
            .store
            .update_returning(&path, Value::Object(update_data), auth_token)
            .await
            .map_err(|e| CatalogError::DatabaseError(e.to_string()))?;

        let row = rows.into_iter().next().ok_or(CatalogError::NotFound)?;
        serde_json::from_value(row)
            .map_err(|e| CatalogError::DatabaseError(format!("Failed to parse service: {}", e)))
    }

    /// Soft delete: the service is deactivated so existing appointments keep
    /// their snapshot while new bookings can no longer reference it.
    pub async fn deactivate_service(&self, service_id: Uuid, auth_token: Option<&str>) -> Result<(), CatalogError> {
        debug!("Deactivating service: {}", service_id);

        self.get_service(service_id, auth_token).await?;

        let path = format!("/rest/v1/services?id=eq.{}", service_id);
        let body = json!({
            "is_active": false,
            "updated_at": Utc::now().to_rfc3339()
        });

        self.store
            .update_returning(&path, body, auth_token)
            .await
            .map_err(|e| CatalogError::DatabaseError(e.to_string()))?;

        Ok(())
    }
}

fn validate_pricing(price: f64, duration_minutes: i32) -> Result<(), CatalogError> {
    if price < 0.0 {
        return Err(CatalogError::ValidationError("Price cannot be negative".to_string()));
    }
    if duration_minutes < 1 {
        return Err(CatalogError::ValidationError(
            "Duration must be at least one minute".to_string(),
        ));
    }
    Ok(())
}

fn parse_services(rows: Vec<Value>) -> Result<Vec<Service>, CatalogError> {
    rows.into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<Service>, _>>()
        .map_err(|e| CatalogError::DatabaseError(format!("Failed to parse services: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_price() {
        let result = validate_pricing(-1.0, 30);
        assert!(matches!(result, Err(CatalogError::ValidationError(_))));
    }

    #[test]
    fn rejects_zero_duration() {
        let result = validate_pricing(500.0, 0);
        assert!(matches!(result, Err(CatalogError::ValidationError(_))));
    }

    #[test]
    fn accepts_valid_pricing() {
        assert!(validate_pricing(0.0, 1).is_ok());
        assert!(validate_pricing(500.0, 30).is_ok());
    }
}
