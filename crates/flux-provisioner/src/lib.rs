pub mod annotations;
pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod publisher;
pub mod scheduler;
pub mod shutdown;
pub mod transformer;

pub use annotations::ZabbixAnnotations;
pub use config::{LoggingConfig, ProvisionerConfig};
pub use discovery::{DiscoveryDocument, DiscoveryEntry, HostGroups};
pub use error::{CycleError, PublishError};
pub use publisher::{PublishReport, Publisher};
pub use scheduler::{CycleReport, Scheduler};
pub use shutdown::{ShutdownHandle, ShutdownListener, ShutdownSignal};
pub use transformer::RuleTransformer;
