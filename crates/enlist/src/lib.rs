//! Enlists named handler members of a service as subscriptions on a
//! publish/subscribe bus, deriving subject and queue-group names from a
//! naming convention and tying every live subscription to a shared
//! cancellation signal.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Naming rules deriving subjects and queue names from type and member names.
pub mod convention;

/// Resolved, ready-to-register subscription descriptors.
pub mod descriptor;

/// Message envelope and the handler seam.
pub mod handler;

/// Registration builder enumerating a service's handler members.
pub mod service;

/// Subscription lifecycle management and the registration facade.
pub mod subscriber;

/// Transport seam implemented by message-bus backends.
pub mod transport;
