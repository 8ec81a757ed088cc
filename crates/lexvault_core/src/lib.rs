pub mod domain;
pub mod error;
pub mod policy;
pub mod ports;
pub mod secrets;
pub mod store;
pub mod workspace;

pub use domain::{
    AuditLogEntry, Brief, Document, Notification, NotificationKind, ProfessionalRole, SavedBrief,
    SettingsPatch, SystemSettings, User,
};
pub use error::{ErrorKind, WorkspaceError, WorkspaceResult};
pub use policy::{AdminCredential, WorkspacePolicy};
pub use ports::{
    AdminAdvisoryService, AdvisoryService, Collection, ExtractionRequest, ExtractionService,
    KeyValueStore, MailService, PortError, PortResult, SupportService,
};
pub use store::{MemoryStore, Store};
pub use workspace::{
    DocumentPhase, Feature, LoginOutcome, PinEnrollmentStep, UserProfile, Workspace,
    WorkspaceServices, WorkspaceSnapshot,
};
