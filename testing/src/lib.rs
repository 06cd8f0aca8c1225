//! # Commander Testing
//!
//! Test doubles for the Commander request pipeline.
//!
//! This crate provides:
//! - [`RecordingLogger`]: captures every log entry and alert
//! - [`RecordingValidator`]: records each value it validates, optionally
//!   rejecting or stalling
//! - [`ScriptedCommand`]: records the order of lifecycle calls and answers
//!   with scripted outcomes
//! - [`InMemoryRepository`]: the full repository contract over JSON documents
//!
//! Every double is cheap to clone and clones share state, so a test keeps
//! one handle while the pipeline owns another.
//!
//! ## Example
//!
//! ```ignore
//! use commander_testing::{RecordingLogger, ScriptedCommand};
//!
//! #[tokio::test]
//! async fn test_flow() {
//!     let logger = RecordingLogger::new();
//!     let command = ScriptedCommand::returning(Arc::new(logger.clone()), "ok");
//!     let calls = command.calls();
//!
//!     let mut handler = Handler::new(command, config, Arc::new(logger.clone()));
//!     handler.handle(RequestEvent::new(Method::GET)).await;
//!
//!     assert_eq!(calls.snapshot(), vec![Call::Clean, Call::Authenticate, Call::Run]);
//! }
//! ```

pub mod command;
pub mod logger;
pub mod repository;
pub mod validator;

pub use command::{Call, CallLog, ScriptedCommand};
pub use logger::{LogEntry, RecordingLogger};
pub use repository::InMemoryRepository;
pub use validator::RecordingValidator;
