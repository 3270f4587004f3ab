// libs/appointment-cell/src/services/policy.rs
//
// Access policy for appointment operations: one place mapping
// (caller id, caller role, appointment owners) to the actions the caller
// may take, instead of role-string comparisons scattered per endpoint.

use shared_models::auth::User;

use crate::models::Appointment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Client,
    Master,
    Admin,
}

impl Role {
    /// Unknown or missing roles get the least-privileged treatment.
    pub fn from_user(user: &User) -> Self {
        match user.role.as_deref() {
            Some("admin") => Role::Admin,
            Some("master") => Role::Master,
            _ => Role::Client,
        }
    }
}

/// The owning client, the assigned master, or an administrator may cancel.
pub fn can_cancel(caller_id: &str, role: Role, appointment: &Appointment) -> bool {
    if role == Role::Admin {
        return true;
    }
    caller_id == appointment.client_id.to_string() || caller_id == appointment.master_id.to_string()
}

/// Only the assigned master or an administrator may complete.
pub fn can_complete(caller_id: &str, role: Role, appointment: &Appointment) -> bool {
    match role {
        Role::Admin => true,
        Role::Master => caller_id == appointment.master_id.to_string(),
        Role::Client => false,
    }
}

/// Administrative update and delete.
pub fn can_administer(role: Role) -> bool {
    role == Role::Admin
}
