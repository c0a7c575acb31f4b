//! Access guard for resumes. Ownership grants read and write; public visibility grants read only.

use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::Resume;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allowed,
    Denied,
}

impl Access {
    pub fn require(self) -> Result<(), AppError> {
        match self {
            Access::Allowed => Ok(()),
            Access::Denied => Err(AppError::Denied),
        }
    }
}

pub fn authorize_read(requester_id: Uuid, resume: &Resume) -> Access {
    if resume.owner_id == requester_id || resume.is_public {
        Access::Allowed
    } else {
        Access::Denied
    }
}

pub fn authorize_write(requester_id: Uuid, resume: &Resume) -> Access {
    if resume.owner_id == requester_id {
        Access::Allowed
    } else {
        Access::Denied
    }
}
