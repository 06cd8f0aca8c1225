//! Pipeline orchestration.

use crate::config::HandlerConfig;
use crate::cors::CorsConfig;
use crate::mapper::{EventMapper, Passthrough};
use crate::telemetry::correlation_id;
use commander_core::http::StatusCode;
use commander_core::{Command, Logger, RequestEvent, Response, Result, Validator, ValidatorChain};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::Instrument;

/// Drives one [`Command`] through the request pipeline.
///
/// The handler owns its command and drives it through `&mut self`, so
/// invocations on one handler are serialized by construction. Run several
/// handlers to serve concurrent requests.
pub struct Handler<C: Command, M = Passthrough> {
    command: C,
    mapper: M,
    cors: CorsConfig,
    logger: Arc<dyn Logger>,
    input_validators: ValidatorChain<C::Input>,
    output_validators: ValidatorChain<C::Output>,
}

impl<C> Handler<C, Passthrough>
where
    C: Command<Input = RequestEvent>,
{
    /// Handler whose command consumes the raw event.
    #[must_use]
    pub fn new(command: C, config: HandlerConfig, logger: Arc<dyn Logger>) -> Self {
        Self::with_mapper(command, Passthrough, config, logger)
    }
}

impl<C, M> Handler<C, M>
where
    C: Command,
    M: EventMapper<Output = C::Input>,
{
    /// Handler that maps each event with `mapper` before validation.
    #[must_use]
    pub fn with_mapper(command: C, mapper: M, config: HandlerConfig, logger: Arc<dyn Logger>) -> Self {
        Self {
            command,
            mapper,
            cors: config.cors,
            logger,
            input_validators: ValidatorChain::new(),
            output_validators: ValidatorChain::new(),
        }
    }

    /// Register an input validator, handing it the handler's logger.
    #[must_use]
    pub fn add_input_validator<V>(mut self, mut validator: V) -> Self
    where
        V: Validator<C::Input> + 'static,
    {
        validator.attach_logger(Arc::clone(&self.logger));
        self.input_validators.push(Box::new(validator));
        self
    }

    /// Register an output validator, handing it the handler's logger.
    #[must_use]
    pub fn add_output_validator<V>(mut self, mut validator: V) -> Self
    where
        V: Validator<C::Output> + 'static,
    {
        validator.attach_logger(Arc::clone(&self.logger));
        self.output_validators.push(Box::new(validator));
        self
    }

    /// The command.
    pub const fn command(&self) -> &C {
        &self.command
    }

    /// The handler's logger.
    #[must_use]
    pub fn logger(&self) -> Arc<dyn Logger> {
        Arc::clone(&self.logger)
    }
}

impl<C, M> Handler<C, M>
where
    C: Command,
    C::Input: Sync,
    C::Output: Serialize + Sync,
    M: EventMapper<Output = C::Input>,
{
    /// Process one event into exactly one response.
    ///
    /// Never fails: every failure is logged and rendered.
    pub async fn handle(&mut self, event: RequestEvent) -> Response {
        let correlation_id = correlation_id(&event.headers);
        let span = tracing::info_span!(
            "invocation",
            method = %event.method,
            correlation_id = %correlation_id,
        );
        self.respond(&event).instrument(span).await
    }

    async fn respond(&mut self, event: &RequestEvent) -> Response {
        if event.is_preflight() {
            self.logger.information(&"OPTIONS request");
            return Response::new(StatusCode::OK, self.cors.preflight_headers(&event.headers), "");
        }

        let headers = self.cors.response_headers(&event.headers);
        match self.process(event).await {
            Ok(body) => Response::new(StatusCode::OK, headers, body),
            Err(err) => err.into_response(&headers, self.logger.as_ref()),
        }
    }

    async fn process(&mut self, event: &RequestEvent) -> Result<String> {
        let input = self.mapper.map(event).await?;
        self.input_validators.run(&input).await?;

        self.command.clean();
        self.command.set_logger(Arc::clone(&self.logger));
        self.command.authenticate(event).await?;

        let output = self.command.run(input).await?;
        self.output_validators.run(&output).await?;

        tracing::debug!("Command completed");
        Ok(serde_json::to_string(&output)?)
    }
}

impl<C, M> fmt::Debug for Handler<C, M>
where
    C: Command + fmt::Debug,
    M: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("command", &self.command)
            .field("mapper", &self.mapper)
            .field("cors", &self.cors)
            .field("input_validators", &self.input_validators)
            .field("output_validators", &self.output_validators)
            .finish_non_exhaustive()
    }
}
