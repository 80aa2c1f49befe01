pub mod error;
pub mod model;
pub mod protocol;
pub mod sender;

pub use error::{Result, SenderError};
pub use model::{DataItem, SenderRequest, SenderResponse, SenderSummary};
pub use sender::{TrapperSender, ZabbixSender, DEFAULT_CONNECT_TIMEOUT, DEFAULT_IO_TIMEOUT};
