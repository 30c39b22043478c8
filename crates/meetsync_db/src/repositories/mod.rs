//! Repositories, one per persisted aggregate.

pub mod availability;
pub mod leads;
pub mod meetings;
pub mod staff;
pub mod webhook_jobs;

pub use availability::AvailabilityRepository;
pub use leads::LeadRepository;
pub use meetings::MeetingRepository;
pub use staff::StaffRepository;
pub use webhook_jobs::WebhookJobRepository;
