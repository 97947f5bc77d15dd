pub mod controller;
pub mod environment;
pub mod error;
pub mod inline_message;
pub mod notifications;
pub mod session;
pub mod transport;

pub use controller::{ControllerSnapshot, DocumentController, OperationOutcome};
pub use environment::{AlwaysConfirm, ConfirmationGate, DocumentSink, SelectedFile};
pub use error::{ClientError, ErrorKind, Operation};
pub use inline_message::{InlineMessage, InlineMessageKind, InlineMessageSlot};
pub use notifications::{
    Notification, NotificationCenter, NotificationEvent, NotificationId, NotificationKind,
};
pub use session::SessionBootstrapper;
pub use transport::{DocumentApi, HttpDocumentApi};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
