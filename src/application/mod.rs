pub mod acquisition;
pub mod download_coordinator;
pub mod orchestrator;
pub mod session;

pub use acquisition::Acquirer;
pub use download_coordinator::{DownloadCoordinator, TransferEvent};
pub use orchestrator::DownloadOrchestrator;
pub use session::{Session, SubmitRejected};
