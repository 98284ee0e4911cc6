//! # Tether Core
//!
//! Protocol-independent building blocks of the tether persistent connection
//! client.
//!
//! This crate holds everything the orchestrator needs that does not touch a
//! socket:
//!
//! - **Failure taxonomy**: one [`FailureClass`] for both protocol variants,
//!   produced by [`ConnectError::classify`]
//! - **Backoff**: [`BackoffPolicy`] and its attempt counter [`Backoff`]
//! - **Shutdown**: the single-fire [`ShutdownSignal`] shared by one epoch
//! - **Framing**: the [`FrameCodec`] trait with [`RtmCodec`] and
//!   [`SocketModeCodec`]
//! - **Events**: the closed [`Event`] / [`PlatformEvent`] catalog
//! - **Liveness**: [`LivenessStrategy`] and the [`PendingProbes`] table
//! - **Session bootstrap**: the [`SessionBootstrap`] seam and endpoint
//!   normalization
//!
//! ## Data Flow
//!
//! ```text
//! ┌───────────┐   text   ┌────────────┐  Frame   ┌──────────────┐
//! │   wire    │────────▶│ FrameCodec │────────▶│ orchestrator │──▶ Event feed
//! └───────────┘          └────────────┘          └──────────────┘
//!       ▲                      │ encode                 │
//!       └──────────────────────┴──── WriteItem ◀────────┘
//! ```

pub mod backoff;
pub mod config;
pub mod error;
pub mod event;
pub mod liveness;
pub mod outgoing;
pub mod protocol;
pub mod session;
pub mod shutdown;

pub use backoff::{Backoff, BackoffPolicy};
pub use config::{ClientConfig, Protocol};
pub use error::{
    BootstrapError, BootstrapResult, ClientError, ClientResult, ConnectError, DialError,
    DialResult, FATAL_PLATFORM_CODES, FailureClass, TeardownReason, is_auth_status,
};
pub use event::{Event, PlatformEvent, SendFailure};
pub use liveness::{LivenessStrategy, PendingProbes};
pub use outgoing::{Outgoing, OutgoingMessage, WriteItem};
pub use protocol::{Decoded, Frame, FrameCodec, RtmCodec, SocketModeCodec};
pub use session::{Session, SessionBootstrap, SessionInfo, normalize_endpoint};
pub use shutdown::ShutdownSignal;

/// Prelude for common imports.
pub mod prelude {
    pub use super::{
        BackoffPolicy, ClientConfig, ClientError, Event, Outgoing, PlatformEvent, Protocol,
        SessionBootstrap, TeardownReason,
    };
}
