// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, NaiveDate, NaiveTime, Utc};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use master_cell::ScheduleService;
use service_cell::models::CatalogError;
use service_cell::services::catalog::CatalogService;
use shared_database::SupabaseClient;

use crate::models::{
    Appointment, AppointmentError, AppointmentListItem, AppointmentStatus, BookAppointmentRequest,
    UpdateAppointmentRequest,
};
use crate::services::lifecycle::AppointmentLifecycleService;

pub struct AppointmentBookingService {
    store: Arc<SupabaseClient>,
    schedule_service: ScheduleService,
    catalog_service: CatalogService,
    lifecycle_service: AppointmentLifecycleService,
}

impl AppointmentBookingService {
    pub fn new(store: Arc<SupabaseClient>) -> Self {
        let schedule_service = ScheduleService::new(Arc::clone(&store));
        let catalog_service = CatalogService::new(Arc::clone(&store));
        let lifecycle_service = AppointmentLifecycleService::new();

        Self {
            store,
            schedule_service,
            catalog_service,
            lifecycle_service,
        }
    }

    /// Book a slot for the authenticated client.
    ///
    /// The slot claim is the serialization point: `claim_slot` flips
    /// `is_available` from true to false with a conditional update, so of two
    /// concurrent bookings for the same (master, date, time) at most one
    /// proceeds past step 4. If the insert then fails, the claim is undone
    /// before the error is surfaced.
    pub async fn book_appointment(
        &self,
        client_id: Uuid,
        request: BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        info!(
            "Booking appointment for client {} with master {} on {} at {}",
            client_id, request.master_id, request.appointment_date, request.start_time
        );

        // Step 1: service lookup gives the price and duration to snapshot
        let service = self
            .catalog_service
            .get_service(request.service_id, Some(auth_token))
            .await
            .map_err(|e| match e {
                CatalogError::NotFound => AppointmentError::ServiceNotFound,
                CatalogError::ValidationError(msg) => AppointmentError::ValidationError(msg),
                CatalogError::DatabaseError(msg) => AppointmentError::DatabaseError(msg),
            })?;
        if !service.is_active {
            return Err(AppointmentError::ServiceNotFound);
        }

        // Step 2: derive the end time on a 24-hour clock
        let end_time = compute_end_time(request.start_time, service.duration_minutes)?;

        // Step 3: friendly duplicate check before touching the slot
        let conflict_path = format!(
            "/rest/v1/appointments?master_id=eq.{}&appointment_date=eq.{}&start_time=eq.{}&status=neq.cancelled&select=id",
            request.master_id,
            request.appointment_date.format("%Y-%m-%d"),
            urlencoding::encode(&request.start_time.format("%H:%M:%S").to_string())
        );
        let existing = self
            .store
            .select(&conflict_path, Some(auth_token))
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;
        if !existing.is_empty() {
            warn!(
                "Booking conflict for master {} at {} {}",
                request.master_id, request.appointment_date, request.start_time
            );
            return Err(AppointmentError::Conflict);
        }

        // Step 4: atomically claim the slot
        let claimed = self
            .schedule_service
            .claim_slot(
                request.master_id,
                request.appointment_date,
                request.start_time,
                auth_token,
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;
        if !claimed {
            return Err(AppointmentError::SlotUnavailable);
        }

        // Step 5: insert the appointment with price and end time snapshots
        let body = json!({
            "client_id": client_id,
            "master_id": request.master_id,
            "service_id": request.service_id,
            "appointment_date": request.appointment_date.format("%Y-%m-%d").to_string(),
            "start_time": request.start_time.format("%H:%M:%S").to_string(),
            "end_time": end_time.format("%H:%M:%S").to_string(),
            "total_price": service.price,
            "status": "scheduled",
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let inserted = self
            .store
            .insert_returning("/rest/v1/appointments", body, Some(auth_token))
            .await;

        let rows = match inserted {
            Ok(rows) => rows,
            Err(e) => {
                // Undo the claim so the slot is not stranded without a booking
                warn!("Appointment insert failed after slot claim, releasing slot: {}", e);
                let _ = self
                    .schedule_service
                    .release_slot(
                        request.master_id,
                        request.appointment_date,
                        request.start_time,
                        auth_token,
                    )
                    .await;
                return Err(AppointmentError::DatabaseError(e.to_string()));
            }
        };

        let appointment = parse_appointment_rows(rows)?;
        info!("Appointment {} booked successfully", appointment.id);
        Ok(appointment)
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Fetching appointment: {}", appointment_id);

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let rows = self
            .store
            .select(&path, Some(auth_token))
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let row = rows.into_iter().next().ok_or(AppointmentError::NotFound)?;
        serde_json::from_value(row)
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))
    }

    /// A client's own appointments, newest first, with master and service
    /// display fields embedded.
    pub async fn list_for_client(
        &self,
        client_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<AppointmentListItem>, AppointmentError> {
        debug!("Listing appointments for client: {}", client_id);

        let path = format!(
            "/rest/v1/appointments?client_id=eq.{}&select=*,service:services(name),master:users!appointments_master_id_fkey(first_name,last_name,phone)&order=appointment_date.desc,start_time.desc",
            client_id
        );
        self.fetch_list(&path, auth_token).await
    }

    /// A master's appointments, optionally narrowed to one date.
    pub async fn list_for_master(
        &self,
        master_id: Uuid,
        date: Option<NaiveDate>,
        auth_token: &str,
    ) -> Result<Vec<AppointmentListItem>, AppointmentError> {
        debug!("Listing appointments for master: {}", master_id);

        let mut path = format!(
            "/rest/v1/appointments?master_id=eq.{}&select=*,service:services(name),client:users!appointments_client_id_fkey(first_name,last_name,phone)",
            master_id
        );
        if let Some(date) = date {
            path.push_str(&format!("&appointment_date=eq.{}", date.format("%Y-%m-%d")));
        }
        path.push_str("&order=appointment_date.desc,start_time.desc");

        self.fetch_list(&path, auth_token).await
    }

    /// Every appointment in the system, for the admin overview.
    pub async fn list_all(&self, auth_token: &str) -> Result<Vec<AppointmentListItem>, AppointmentError> {
        debug!("Listing all appointments");

        let path = "/rest/v1/appointments?select=*,service:services(name),client:users!appointments_client_id_fkey(first_name,last_name,phone),master:users!appointments_master_id_fkey(first_name,last_name,phone)&order=appointment_date.desc,start_time.desc";
        self.fetch_list(path, auth_token).await
    }

    /// Cancel and free the slot. Authorization has already been checked by
    /// the caller against the access policy; this enforces the lifecycle.
    pub async fn cancel_appointment(
        &self,
        appointment: &Appointment,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Cancelling appointment: {}", appointment.id);

        self.lifecycle_service
            .validate_status_transition(&appointment.status, &AppointmentStatus::Cancelled)?;

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment.id);
        let body = json!({
            "status": "cancelled",
            "updated_at": Utc::now().to_rfc3339()
        });
        let rows = self
            .store
            .update_returning(&path, body, Some(auth_token))
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;
        let cancelled = parse_appointment_rows(rows)?;

        // Give the slot back; a missing slot row (day was rescheduled) is fine
        let (master_id, date, start_time) = appointment.slot_key();
        self.schedule_service
            .release_slot(master_id, date, start_time, auth_token)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        info!("Appointment {} cancelled", appointment.id);
        Ok(cancelled)
    }

    /// Mark the visit as done. The slot stays consumed - completing does not
    /// free capacity.
    pub async fn complete_appointment(
        &self,
        appointment: &Appointment,
        notes: Option<String>,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Completing appointment: {}", appointment.id);

        self.lifecycle_service
            .validate_status_transition(&appointment.status, &AppointmentStatus::Completed)?;

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment.id);
        let body = json!({
            "status": "completed",
            "notes": notes.unwrap_or_default(),
            "updated_at": Utc::now().to_rfc3339()
        });
        let rows = self
            .store
            .update_returning(&path, body, Some(auth_token))
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let completed = parse_appointment_rows(rows)?;
        info!("Appointment {} completed", appointment.id);
        Ok(completed)
    }

    /// Administrative partial update. Deliberately does NOT re-validate slot
    /// availability for a changed master, date or time - the admin override
    /// may double-book on purpose. Status changes still respect the
    /// lifecycle, so terminal appointments stay terminal.
    pub async fn update_appointment(
        &self,
        appointment_id: Uuid,
        request: UpdateAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Updating appointment: {}", appointment_id);

        let current = self.get_appointment(appointment_id, auth_token).await?;

        if request.is_empty() {
            return Err(AppointmentError::ValidationError("No fields to update".to_string()));
        }

        if let Some(new_status) = &request.status {
            if *new_status != current.status {
                self.lifecycle_service
                    .validate_status_transition(&current.status, new_status)?;
            }
        }

        let mut update_data = serde_json::Map::new();

        if let Some(service_id) = request.service_id {
            let service = self
                .catalog_service
                .get_service(service_id, Some(auth_token))
                .await
                .map_err(|e| match e {
                    CatalogError::NotFound => AppointmentError::ServiceNotFound,
                    CatalogError::ValidationError(msg) => AppointmentError::ValidationError(msg),
                    CatalogError::DatabaseError(msg) => AppointmentError::DatabaseError(msg),
                })?;
            if !service.is_active {
                return Err(AppointmentError::ServiceNotFound);
            }

            // New service, new snapshot: price now, end time from its duration
            let base_start = request.start_time.unwrap_or(current.start_time);
            let end_time = compute_end_time(base_start, service.duration_minutes)?;

            update_data.insert("service_id".to_string(), json!(service_id));
            update_data.insert("total_price".to_string(), json!(service.price));
            update_data.insert(
                "end_time".to_string(),
                json!(end_time.format("%H:%M:%S").to_string()),
            );
        }

        if let Some(master_id) = request.master_id {
            update_data.insert("master_id".to_string(), json!(master_id));
        }
        if let Some(date) = request.appointment_date {
            update_data.insert(
                "appointment_date".to_string(),
                json!(date.format("%Y-%m-%d").to_string()),
            );
        }
        if let Some(start_time) = request.start_time {
            update_data.insert(
                "start_time".to_string(),
                json!(start_time.format("%H:%M:%S").to_string()),
            );
        }
        if let Some(status) = request.status {
            update_data.insert("status".to_string(), json!(status.to_string()));
        }
        if let Some(notes) = request.notes {
            update_data.insert("notes".to_string(), json!(notes));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let rows = self
            .store
            .update_returning(&path, Value::Object(update_data), Some(auth_token))
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let updated = parse_appointment_rows(rows)?;
        info!("Appointment {} updated", appointment_id);
        Ok(updated)
    }

    /// Remove the row entirely and free its slot, using the key read before
    /// deletion.
    pub async fn delete_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<(), AppointmentError> {
        debug!("Deleting appointment: {}", appointment_id);

        let current = self.get_appointment(appointment_id, auth_token).await?;

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        self.store
            .delete(&path, Some(auth_token))
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let (master_id, date, start_time) = current.slot_key();
        self.schedule_service
            .release_slot(master_id, date, start_time, auth_token)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        info!("Appointment {} deleted", appointment_id);
        Ok(())
    }

    async fn fetch_list(
        &self,
        path: &str,
        auth_token: &str,
    ) -> Result<Vec<AppointmentListItem>, AppointmentError> {
        let rows = self
            .store
            .select(path, Some(auth_token))
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        rows.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<AppointmentListItem>, _>>()
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointments: {}", e)))
    }
}

/// Wall-clock end time on a 24-hour clock. A booking whose duration would
/// run past midnight has no sane single-day representation, so it is
/// rejected instead of silently wrapping.
pub fn compute_end_time(
    start_time: NaiveTime,
    duration_minutes: i32,
) -> Result<NaiveTime, AppointmentError> {
    if duration_minutes <= 0 {
        return Err(AppointmentError::InvalidTime(
            "Service duration must be positive".to_string(),
        ));
    }

    let (end_time, wrapped_seconds) =
        start_time.overflowing_add_signed(ChronoDuration::minutes(duration_minutes as i64));
    if wrapped_seconds != 0 {
        return Err(AppointmentError::InvalidTime(
            "Appointment would run past midnight".to_string(),
        ));
    }

    Ok(end_time)
}

fn parse_appointment_rows(rows: Vec<Value>) -> Result<Appointment, AppointmentError> {
    let row = rows
        .into_iter()
        .next()
        .ok_or(AppointmentError::NotFound)?;
    serde_json::from_value(row)
        .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))
}
