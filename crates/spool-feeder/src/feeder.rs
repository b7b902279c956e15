//! The feeder: carrier-side orchestration of one activation.
//!
//! ```text
//! resolve inputs ──> policy check ──> connect ──> send ──> read ──> persist?
//!   (store or          (store                                        (stored
//!    inline)            mode only)                                    share)
//! ```
//!
//! The carrier is closed on every exit path; close failures are logged by
//! the carrier itself and never mask the error that ended the activation.

use std::sync::Arc;

use tokio::sync::watch;

use spool_engine::{Carrier, Dialer};
use spool_proto::{ProtocolConfig, ResponseDecoder};

use crate::{
    activation::{Activation, ActivationInput, FeedResult, InputSource, OutputMode},
    error::FeedError,
    policy::{CheckRequest, ExecutionTime, PolicyOracle, TagRequest},
    store::{ACCESS_POLICY_TAG, GAME_ID_TAG, OWNER_TAG, SecretShare, SecretStore, Tag},
};

/// Drives one activation against the engine.
pub struct Feeder {
    protocol: Arc<ProtocolConfig>,
    store: Arc<dyn SecretStore>,
    policy: Arc<dyn PolicyOracle>,
    dialer: Arc<dyn Dialer>,
    engine_host: String,
    engine_port: u16,
}

impl Feeder {
    /// Bind a feeder to its collaborators and the engine's feed endpoint.
    pub fn new(
        protocol: Arc<ProtocolConfig>,
        store: Arc<dyn SecretStore>,
        policy: Arc<dyn PolicyOracle>,
        dialer: Arc<dyn Dialer>,
        engine_host: impl Into<String>,
        engine_port: u16,
    ) -> Self {
        Self { protocol, store, policy, dialer, engine_host: engine_host.into(), engine_port }
    }

    /// Run one activation end to end.
    ///
    /// # Errors
    ///
    /// - `FeedError::Store` if an input secret cannot be fetched or the
    ///   result cannot be persisted.
    /// - `FeedError::Unauthorized` if the policy oracle denies or errors.
    /// - `FeedError::Engine` for any carrier failure.
    /// - `FeedError::Policy` if result-tag generation fails.
    pub async fn feed(
        &self,
        activation: Activation,
        shutdown: watch::Receiver<bool>,
    ) -> Result<FeedResult, FeedError> {
        tracing::debug!(game_id = %activation.game_id, program = %activation.program, "feeding activation");

        let (params, inputs) = self.resolve_inputs(&activation).await?;

        if matches!(activation.input, InputSource::Stored(_)) {
            self.authorize(&activation, &inputs).await?;
        }

        let (decoder, aggregate) = self.response_decoder(activation.output);

        let carrier = Carrier::new(Arc::clone(&self.dialer));
        let outcome = self.exchange(&carrier, shutdown, &params, &decoder, aggregate).await;
        carrier.close().await;
        let response = outcome?;

        let response = if activation.output == OutputMode::StoredShare {
            self.persist(&activation, inputs, response).await?
        } else {
            response
        };

        tracing::debug!(game_id = %activation.game_id, values = response.len(), "activation complete");
        Ok(FeedResult { response })
    }

    /// Resolve the shares to push and the policy inputs.
    ///
    /// Store mode fetches every secret and lifts its ownership tags into
    /// [`ActivationInput`]s; inline mode sends the request's own params and
    /// carries no policy inputs.
    async fn resolve_inputs(
        &self,
        activation: &Activation,
    ) -> Result<(Vec<String>, Vec<ActivationInput>), FeedError> {
        match &activation.input {
            InputSource::Inline(params) => Ok((params.clone(), Vec::new())),
            InputSource::Stored(ids) => {
                let mut params = Vec::with_capacity(ids.len());
                let mut inputs = Vec::with_capacity(ids.len());
                for id in ids {
                    let share = self.store.get(id, &activation.program).await?;
                    inputs.push(ActivationInput {
                        secret_id: id.clone(),
                        owner: share.tag_value(OWNER_TAG).unwrap_or_default().to_string(),
                        access_policy: share
                            .tag_value(ACCESS_POLICY_TAG)
                            .unwrap_or_default()
                            .to_string(),
                    });
                    params.push(share.data);
                }
                Ok((params, inputs))
            },
        }
    }

    async fn authorize(
        &self,
        activation: &Activation,
        inputs: &[ActivationInput],
    ) -> Result<(), FeedError> {
        let request = CheckRequest {
            subject: activation.program.clone(),
            inputs: inputs.to_vec(),
            time: ExecutionTime::now(),
            player_count: self.protocol.player_count,
        };

        match self.policy.can_execute(request).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(FeedError::Unauthorized(format!(
                "policy denied program {} for game {}",
                activation.program, activation.game_id
            ))),
            Err(e) => Err(FeedError::Unauthorized(format!("policy check failed: {e}"))),
        }
    }

    fn response_decoder(&self, mode: OutputMode) -> (ResponseDecoder, bool) {
        match mode {
            OutputMode::Plaintext => {
                (ResponseDecoder::Plaintext(self.protocol.plaintext_decoder()), false)
            },
            OutputMode::SecretShare => (ResponseDecoder::Share, false),
            OutputMode::StoredShare => (ResponseDecoder::Share, true),
        }
    }

    async fn exchange(
        &self,
        carrier: &Carrier,
        shutdown: watch::Receiver<bool>,
        params: &[String],
        decoder: &ResponseDecoder,
        aggregate: bool,
    ) -> Result<Vec<String>, FeedError> {
        carrier
            .connect(shutdown, self.protocol.player_id, &self.engine_host, self.engine_port)
            .await?;
        carrier.send(params).await?;
        Ok(carrier.read(decoder, aggregate).await?)
    }

    /// Persist an aggregated response as a new secret under the game id.
    async fn persist(
        &self,
        activation: &Activation,
        inputs: Vec<ActivationInput>,
        response: Vec<String>,
    ) -> Result<Vec<String>, FeedError> {
        // INVARIANT: this path only runs for stored-share activations, which
        // read with aggregate = true; an aggregated decode concatenates every
        // parcel body into exactly one blob, and an empty response already
        // failed the read as EmptyResponse.
        #[allow(clippy::expect_used)]
        let data = response
            .into_iter()
            .next()
            .expect("invariant: aggregated decode yields exactly one blob");

        let generated = self.policy.generate_tags(TagRequest { inputs }).await?;
        let mut tags = Vec::with_capacity(generated.len() + 1);
        tags.push(Tag::string(GAME_ID_TAG, &activation.game_id));
        tags.extend(generated.into_iter().map(Tag::normalized));

        self.store
            .create(SecretShare { id: activation.game_id.clone(), data, tags })
            .await?;

        tracing::info!(game_id = %activation.game_id, "engine result stored as secret");
        Ok(vec![activation.game_id.clone()])
    }
}
