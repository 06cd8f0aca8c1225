//! Request handler for serverless HTTP entry points.
//!
//! A [`Handler`] owns one [`Command`](commander_core::Command) and turns each
//! inbound [`RequestEvent`](commander_core::RequestEvent) into exactly one
//! [`Response`](commander_core::Response).
//!
//! # Request Flow
//!
//! 1. **Preflight** `OPTIONS` requests are answered with CORS headers only
//! 2. **Map** the raw event to the command input ([`mapper`])
//! 3. **Validate** the input (all validators, concurrently)
//! 4. **Clean** the command and hand it the handler's logger
//! 5. **Authenticate** against the raw event
//! 6. **Run** the command
//! 7. **Validate** the output
//! 8. **Respond** with the JSON body, fixed security headers and CORS headers
//!
//! Any failure in steps 2 to 8 becomes a response too: classified failures
//! render themselves, everything else becomes a generic 500.
//!
//! # Example
//!
//! ```ignore
//! use commander_web::{Handler, HandlerConfig, PathParameterMapper, telemetry};
//! use commander_core::{Anonymous, ProcessEnv, RegexValidator};
//!
//! telemetry::install_subscriber("info");
//! let logger = telemetry::logger_from_env(&ProcessEnv)?;
//!
//! let mut handler = Handler::with_mapper(
//!     Anonymous::new(GetAsset::new(assets), logger.clone()),
//!     PathParameterMapper::new("assetId").required(),
//!     HandlerConfig::from_env(&ProcessEnv),
//!     logger,
//! )
//! .add_input_validator(RegexValidator::parse("^[a-z0-9-]{1,64}$")?);
//!
//! let response = handler.handle(event).await;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod cors;
pub mod handler;
pub mod mapper;
pub mod telemetry;

pub use config::HandlerConfig;
pub use cors::CorsConfig;
pub use handler::Handler;
pub use mapper::{BodyMapper, EventMapper, HeadersMapper, Passthrough, PathParameterMapper};
