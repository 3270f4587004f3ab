// libs/master-cell/src/services/master.rs
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_database::SupabaseClient;

use crate::models::{
    CreateMasterRequest, Master, MasterError, MasterServiceEntry, MasterStats, TodayAppointment,
    UpdateMasterRequest,
};

const STATS_WINDOW_DAYS: i64 = 30;

pub struct MasterService {
    store: Arc<SupabaseClient>,
}

impl MasterService {
    pub fn new(store: Arc<SupabaseClient>) -> Self {
        Self { store }
    }

    /// Public list of masters with their offered service names aggregated in.
    pub async fn list_masters(&self, auth_token: Option<&str>) -> Result<Vec<Master>, MasterError> {
        debug!("Listing masters");

        let rows = self
            .store
            .select(
                "/rest/v1/users?role=eq.master&select=id,first_name,last_name,phone,avatar_url&order=first_name.asc",
                auth_token,
            )
            .await
            .map_err(|e| MasterError::DatabaseError(e.to_string()))?;

        let mut masters: Vec<Master> = rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Master>, _>>()
            .map_err(|e| MasterError::DatabaseError(format!("Failed to parse masters: {}", e)))?;

        // Names come from the link table in one query, grouped here
        let links = self
            .store
            .select(
                "/rest/v1/master_services?select=master_id,service:services(name)",
                auth_token,
            )
            .await
            .map_err(|e| MasterError::DatabaseError(e.to_string()))?;

        let mut names_by_master: HashMap<String, Vec<String>> = HashMap::new();
        for link in links {
            let master_id = link.get("master_id").and_then(Value::as_str).unwrap_or_default();
            if let Some(name) = link
                .get("service")
                .and_then(|s| s.get("name"))
                .and_then(Value::as_str)
            {
                names_by_master
                    .entry(master_id.to_string())
                    .or_default()
                    .push(name.to_string());
            }
        }

        for master in &mut masters {
            if let Some(names) = names_by_master.remove(&master.id.to_string()) {
                master.services = names;
            }
        }

        Ok(masters)
    }

    pub async fn get_master(&self, master_id: Uuid, auth_token: &str) -> Result<Master, MasterError> {
        debug!("Fetching master: {}", master_id);

        let path = format!(
            "/rest/v1/users?id=eq.{}&role=eq.master&select=id,first_name,last_name,phone,avatar_url",
            master_id
        );
        let rows = self
            .store
            .select(&path, Some(auth_token))
            .await
            .map_err(|e| MasterError::DatabaseError(e.to_string()))?;

        let row = rows.into_iter().next().ok_or(MasterError::NotFound)?;
        serde_json::from_value(row)
            .map_err(|e| MasterError::DatabaseError(format!("Failed to parse master: {}", e)))
    }

    pub async fn create_master(
        &self,
        request: CreateMasterRequest,
        auth_token: &str,
    ) -> Result<Master, MasterError> {
        let email = request.email.trim().to_lowercase();
        debug!("Creating master profile for: {}", email);

        if email.is_empty() || request.first_name.trim().is_empty() || request.last_name.trim().is_empty() {
            return Err(MasterError::ValidationError(
                "Email, first name and last name are required".to_string(),
            ));
        }

        let existing = self
            .store
            .select(&format!("/rest/v1/users?email=eq.{}&select=id", email), Some(auth_token))
            .await
            .map_err(|e| MasterError::DatabaseError(e.to_string()))?;
        if !existing.is_empty() {
            return Err(MasterError::EmailTaken);
        }

        let body = json!({
            "email": email,
            "first_name": request.first_name,
            "last_name": request.last_name,
            "phone": request.phone,
            "avatar_url": request.avatar_url,
            "role": "master",
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let rows = self
            .store
            .insert_returning("/rest/v1/users", body, Some(auth_token))
            .await
            .map_err(|e| MasterError::DatabaseError(e.to_string()))?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| MasterError::DatabaseError("Failed to create master".to_string()))?;
        serde_json::from_value(row)
            .map_err(|e| MasterError::DatabaseError(format!("Failed to parse master: {}", e)))
    }

    pub async fn update_master(
        &self,
        master_id: Uuid,
        request: UpdateMasterRequest,
        auth_token: &str,
    ) -> Result<Master, MasterError> {
        debug!("Updating master: {}", master_id);

        self.get_master(master_id, auth_token).await?;

        let mut update_data = serde_json::Map::new();
        if let Some(email) = request.email {
            update_data.insert("email".to_string(), json!(email.trim().to_lowercase()));
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
        if let Some(avatar_url) = request.avatar_url {
            update_data.insert("avatar_url".to_string(), json!(avatar_url));
        }

        if update_data.is_empty() {
            return Err(MasterError::ValidationError("No fields to update".to_string()));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/users?id=eq.{}&role=eq.master", master_id);
        let rows = self
            .store
            .update_returning(&path, Value::Object(update_data), Some(auth_token))
            .await
            .map_err(|e| MasterError::DatabaseError(e.to_string()))?;

        let row = rows.into_iter().next().ok_or(MasterError::NotFound)?;
        serde_json::from_value(row)
            .map_err(|e| MasterError::DatabaseError(format!("Failed to parse master: {}", e)))
    }

    pub async fn delete_master(&self, master_id: Uuid, auth_token: &str) -> Result<(), MasterError> {
        debug!("Deleting master: {}", master_id);

        self.get_master(master_id, auth_token).await?;

        let path = format!("/rest/v1/users?id=eq.{}&role=eq.master", master_id);
        self.store
            .delete(&path, Some(auth_token))
            .await
            .map_err(|e| MasterError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    /// Active services offered by a master, for the public booking page.
    pub async fn get_master_services(
        &self,
        master_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Vec<MasterServiceEntry>, MasterError> {
        debug!("Fetching services for master: {}", master_id);

        let path = format!(
            "/rest/v1/master_services?master_id=eq.{}&select=service:services(id,name,description,price,duration_minutes,is_active)",
            master_id
        );
        let rows = self
            .store
            .select(&path, auth_token)
            .await
            .map_err(|e| MasterError::DatabaseError(e.to_string()))?;

        let mut entries = Vec::new();
        for row in rows {
            let Some(service) = row.get("service") else { continue };
            if service.get("is_active").and_then(Value::as_bool) != Some(true) {
                continue;
            }
            let entry: MasterServiceEntry = serde_json::from_value(service.clone())
                .map_err(|e| MasterError::DatabaseError(format!("Failed to parse service: {}", e)))?;
            entries.push(entry);
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(entries)
    }

    /// Replace the master's offered-services link set wholesale.
    pub async fn set_master_services(
        &self,
        master_id: Uuid,
        service_ids: Vec<Uuid>,
        auth_token: &str,
    ) -> Result<(), MasterError> {
        debug!("Replacing services for master: {}", master_id);

        let delete_path = format!("/rest/v1/master_services?master_id=eq.{}", master_id);
        self.store
            .delete(&delete_path, Some(auth_token))
            .await
            .map_err(|e| MasterError::DatabaseError(e.to_string()))?;

        if service_ids.is_empty() {
            return Ok(());
        }

        let rows: Vec<Value> = service_ids
            .iter()
            .map(|service_id| json!({ "master_id": master_id, "service_id": service_id }))
            .collect();

        self.store
            .insert_returning("/rest/v1/master_services", Value::Array(rows), Some(auth_token))
            .await
            .map_err(|e| MasterError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    /// Thirty-day counters plus today's bookings for the master dashboard.
    pub async fn get_master_stats(
        &self,
        master_id: Uuid,
        auth_token: &str,
    ) -> Result<(MasterStats, Vec<TodayAppointment>), MasterError> {
        debug!("Computing stats for master: {}", master_id);

        let today = Utc::now().date_naive();
        let window_start = today - Duration::days(STATS_WINDOW_DAYS);

        let stats_path = format!(
            "/rest/v1/appointments?master_id=eq.{}&appointment_date=gte.{}&select=status,total_price",
            master_id,
            window_start.format("%Y-%m-%d")
        );
        let rows = self
            .store
            .select(&stats_path, Some(auth_token))
            .await
            .map_err(|e| MasterError::DatabaseError(e.to_string()))?;

        let stats = compute_stats(&rows);

        let today_path = format!(
            "/rest/v1/appointments?master_id=eq.{}&appointment_date=eq.{}&select=start_time,end_time,status,service:services(name),client:users!appointments_client_id_fkey(first_name,last_name)&order=start_time.asc",
            master_id,
            today.format("%Y-%m-%d")
        );
        let today_rows = self
            .store
            .select(&today_path, Some(auth_token))
            .await
            .map_err(|e| MasterError::DatabaseError(e.to_string()))?;

        let today_appointments = today_rows
            .into_iter()
            .map(parse_today_appointment)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((stats, today_appointments))
    }
}

fn compute_stats(rows: &[Value]) -> MasterStats {
    let mut stats = MasterStats {
        total_appointments: rows.len() as i64,
        completed_appointments: 0,
        cancelled_appointments: 0,
        total_earnings: 0.0,
        avg_appointment_price: 0.0,
    };

    for row in rows {
        match row.get("status").and_then(Value::as_str) {
            Some("completed") => {
                stats.completed_appointments += 1;
                stats.total_earnings += row.get("total_price").and_then(Value::as_f64).unwrap_or(0.0);
            }
            Some("cancelled") => stats.cancelled_appointments += 1,
            _ => {}
        }
    }

    if stats.completed_appointments > 0 {
        stats.avg_appointment_price = stats.total_earnings / stats.completed_appointments as f64;
    }

    stats
}

fn parse_today_appointment(row: Value) -> Result<TodayAppointment, MasterError> {
    let service_name = row
        .get("service")
        .and_then(|s| s.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let client_name = row.get("client").map(|c| {
        format!(
            "{} {}",
            c.get("first_name").and_then(Value::as_str).unwrap_or_default(),
            c.get("last_name").and_then(Value::as_str).unwrap_or_default()
        )
    });

    let start_time = row
        .get("start_time")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| MasterError::DatabaseError("Malformed appointment start_time".to_string()))?;
    let end_time = row
        .get("end_time")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| MasterError::DatabaseError("Malformed appointment end_time".to_string()))?;
    let status = row
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(TodayAppointment {
        start_time,
        end_time,
        status,
        service_name,
        client_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stats_count_by_status_and_sum_completed_earnings() {
        let rows = vec![
            json!({"status": "completed", "total_price": 500.0}),
            json!({"status": "completed", "total_price": 700.0}),
            json!({"status": "cancelled", "total_price": 500.0}),
            json!({"status": "scheduled", "total_price": 300.0}),
        ];

        let stats = compute_stats(&rows);
        assert_eq!(stats.total_appointments, 4);
        assert_eq!(stats.completed_appointments, 2);
        assert_eq!(stats.cancelled_appointments, 1);
        assert_eq!(stats.total_earnings, 1200.0);
        assert_eq!(stats.avg_appointment_price, 600.0);
    }

    #[test]
    fn stats_handle_empty_window() {
        let stats = compute_stats(&[]);
        assert_eq!(stats.total_appointments, 0);
        assert_eq!(stats.total_earnings, 0.0);
        assert_eq!(stats.avg_appointment_price, 0.0);
    }
}
