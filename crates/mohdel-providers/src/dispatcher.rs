//! Dispatcher: the public answer/completion surface.
//!
//! Resolve identifier → look up provider and credential → pick adapter →
//! call the vendor → interpret failures. Every resolution and validation
//! error is raised before the first byte goes on the wire.
//!
//! A `Dispatcher` is cheap to clone: the catalog, alias index and registry
//! are shared immutable snapshots, and the default HTTP client is pooled.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use mohdel_core::config::{Config, DEFAULT_TIMEOUT_SECS};
use mohdel_core::types::split_model_id;
use mohdel_core::utils::{expand_home, get_catalog_path};
use mohdel_core::{
    AnswerOptions, AnswerResult, Catalog, CatalogEntry, CredentialSource, DefaultModelSource,
    EnvCredentials, EnvFileCredentials, Error, Result,
};

use crate::adapters::{adapter_for, Connection, ModelSpec};
use crate::alias::AliasIndex;
use crate::client::{build_client, ClientOverride};
use crate::registry::{ProviderRegistry, ProviderSpec};

/// A fully resolved model id, split into its parts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedModel {
    /// Canonical `provider/model` id.
    pub id: String,
    pub provider: String,
    pub model_name: String,
}

// ─────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────

/// Assembles a [`Dispatcher`] from its collaborators.
pub struct DispatcherBuilder {
    catalog: Catalog,
    registry: ProviderRegistry,
    credentials: Arc<dyn CredentialSource>,
    default_model: Arc<dyn DefaultModelSource>,
    timeout: Duration,
}

impl DispatcherBuilder {
    /// Where API keys come from. Defaults to the process environment.
    pub fn credentials(mut self, source: impl CredentialSource + 'static) -> Self {
        self.credentials = Arc::new(source);
        self
    }

    /// Where the fallback model id comes from. Defaults to none.
    pub fn default_model(mut self, source: impl DefaultModelSource + 'static) -> Self {
        self.default_model = Arc::new(source);
        self
    }

    /// Request timeout of the shared client.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<Dispatcher> {
        let client = build_client(self.timeout)?;
        let aliases = AliasIndex::build(&self.catalog);
        Ok(Dispatcher {
            catalog: Arc::new(self.catalog),
            aliases: Arc::new(aliases),
            registry: Arc::new(self.registry),
            credentials: self.credentials,
            default_model: self.default_model,
            client,
            timeout: self.timeout,
        })
    }
}

// ─────────────────────────────────────────────
// Dispatcher
// ─────────────────────────────────────────────

/// Routes normalized answer requests to the right vendor adapter.
#[derive(Clone)]
pub struct Dispatcher {
    catalog: Arc<Catalog>,
    aliases: Arc<AliasIndex>,
    registry: Arc<ProviderRegistry>,
    credentials: Arc<dyn CredentialSource>,
    default_model: Arc<dyn DefaultModelSource>,
    client: reqwest::Client,
    timeout: Duration,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("models", &self.catalog.len())
            .field("providers", &self.registry.len())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn builder(catalog: Catalog, registry: ProviderRegistry) -> DispatcherBuilder {
        DispatcherBuilder {
            catalog,
            registry,
            credentials: Arc::new(EnvCredentials),
            default_model: Arc::new(None::<String>),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Dispatcher with env credentials and no default model.
    pub fn new(catalog: Catalog, registry: ProviderRegistry) -> Result<Self> {
        Self::builder(catalog, registry).build()
    }

    /// Everything from a loaded config: catalog file, API base overrides,
    /// default model and timeout. Credentials come from the process
    /// environment, then `~/.mohdel/environment`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let catalog_path: PathBuf = config
            .catalog_path
            .as_deref()
            .map(expand_home)
            .unwrap_or_else(get_catalog_path);
        let catalog = Catalog::load(&catalog_path)?;
        info!(
            path = %catalog_path.display(),
            models = catalog.len(),
            "Catalog loaded"
        );

        Self::builder(catalog, ProviderRegistry::from_config(config))
            .credentials(EnvFileCredentials::load_default())
            .default_model(config.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
    }

    /// Same collaborators, new catalog snapshot and a rebuilt alias index.
    /// In-flight calls on the old dispatcher keep the old snapshot.
    pub fn with_catalog(&self, catalog: Catalog) -> Self {
        let aliases = AliasIndex::build(&catalog);
        Self {
            catalog: Arc::new(catalog),
            aliases: Arc::new(aliases),
            ..self.clone()
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Expand an id or alias to a curated canonical id.
    pub fn resolve(&self, id: &str) -> Result<String> {
        let id = id.trim();
        if id.is_empty() {
            return Err(Error::InvalidInput("model id must be a non-empty string".into()));
        }
        let canonical = self.aliases.resolve(id, &self.catalog)?;
        if !self.catalog.contains(&canonical) {
            return Err(Error::ModelNotCurated(canonical));
        }
        Ok(canonical)
    }

    /// Resolve `id` and check both halves against the registry and catalog.
    pub fn resolve_provider_and_model(&self, id: &str) -> Result<ResolvedModel> {
        let id = id.trim();
        if id.is_empty() {
            return Err(Error::InvalidInput("model id must be a non-empty string".into()));
        }
        let canonical = self.aliases.resolve(id, &self.catalog)?;
        let (provider, model_name) = match split_model_id(&canonical) {
            Some((p, m)) if !p.is_empty() && !m.is_empty() => (p, m),
            _ => return Err(Error::ModelNotCurated(canonical)),
        };
        if self.registry.get(provider).is_none() {
            return Err(Error::UnknownProvider(provider.to_string()));
        }
        if !self.catalog.contains(&canonical) {
            return Err(Error::ModelNotCurated(canonical));
        }
        Ok(ResolvedModel {
            provider: provider.to_string(),
            model_name: model_name.to_string(),
            id: canonical,
        })
    }

    /// Lazy handle on one model; `None` means "the default model".
    pub fn model(&self, id: Option<&str>) -> Model {
        Model {
            dispatcher: self.clone(),
            requested: id.map(str::to_string),
            resolved: OnceCell::new(),
        }
    }

    /// Answer `prompt` with the given model, or the default model when `id`
    /// is `None` or empty.
    pub async fn answer(
        &self,
        id: Option<&str>,
        prompt: &str,
        options: &AnswerOptions,
    ) -> Result<AnswerResult> {
        self.dispatch(id, prompt, options, None).await
    }

    /// [`answer`](Self::answer) with per-call connection settings.
    pub async fn answer_with_override(
        &self,
        id: Option<&str>,
        prompt: &str,
        options: &AnswerOptions,
        client_override: &ClientOverride,
    ) -> Result<AnswerResult> {
        self.dispatch(id, prompt, options, Some(client_override)).await
    }

    /// Just the generated text.
    pub async fn completion(
        &self,
        id: Option<&str>,
        prompt: &str,
        options: &AnswerOptions,
    ) -> Result<String> {
        Ok(self.answer(id, prompt, options).await?.output)
    }

    /// The id to use: the caller's, else the configured default.
    fn requested_id(&self, id: Option<&str>) -> Result<String> {
        match id.map(str::trim).filter(|s| !s.is_empty()) {
            Some(id) => Ok(id.to_string()),
            None => self
                .default_model
                .default_model_id()
                .filter(|s| !s.trim().is_empty())
                .ok_or(Error::NoDefaultModel),
        }
    }

    async fn dispatch(
        &self,
        id: Option<&str>,
        prompt: &str,
        options: &AnswerOptions,
        client_override: Option<&ClientOverride>,
    ) -> Result<AnswerResult> {
        options.validate()?;

        let requested = self.requested_id(id)?;
        let resolved = self.resolve_provider_and_model(&requested)?;
        let provider = self
            .registry
            .get(&resolved.provider)
            .ok_or_else(|| Error::UnknownProvider(resolved.provider.clone()))?;
        let entry = self
            .catalog
            .get(&resolved.id)
            .ok_or_else(|| Error::ModelNotCurated(resolved.id.clone()))?;

        check_capabilities(&resolved.id, entry, options)?;

        let conn = self.connection(provider, client_override)?;
        let adapter = adapter_for(provider.adapter);
        let model = ModelSpec::from_entry(&resolved.id, entry);

        debug!(
            model = %resolved.id,
            provider = provider.display_name,
            adapter = %provider.adapter,
            "Dispatching answer"
        );

        adapter
            .answer(provider, &conn, &model, prompt, options)
            .await
            .map_err(|e| {
                let interpreted = (provider.interpret_error)(&e);
                warn!(
                    model = %resolved.id,
                    code = %interpreted.code,
                    message = %interpreted.message,
                    "Vendor call failed"
                );
                Error::Transport {
                    provider: provider.name.to_string(),
                    message: interpreted.message,
                    code: interpreted.code,
                    source: Box::new(e),
                }
            })
    }

    /// Credential + base URL + client for one call. Never touches the network.
    fn connection(
        &self,
        provider: &ProviderSpec,
        client_override: Option<&ClientOverride>,
    ) -> Result<Connection> {
        let client_override = client_override.filter(|o| !o.is_empty());

        let api_key = client_override
            .and_then(|o| o.api_key.clone())
            .filter(|k| !k.is_empty())
            .or_else(|| self.credentials.get_credential(provider.env_key))
            .ok_or_else(|| Error::MissingCredential {
                provider: provider.name.to_string(),
                env_var: provider.env_key.to_string(),
            })?;

        let api_base = client_override
            .and_then(|o| o.api_base.clone())
            .or_else(|| self.registry.api_base(provider.name).map(str::to_string))
            .unwrap_or_else(|| provider.default_api_base.to_string());

        let client = match client_override {
            Some(o) => {
                debug!(provider = provider.name, "Building call-scoped client");
                build_client(o.timeout.unwrap_or(self.timeout))?
            }
            None => self.client.clone(),
        };

        Ok(Connection::new(client, api_base, api_key))
    }
}

/// Reject requests the catalog says this model cannot serve.
fn check_capabilities(id: &str, entry: &CatalogEntry, options: &AnswerOptions) -> Result<()> {
    if !options.images.is_empty() && entry.supports_images == Some(false) {
        return Err(Error::UnsupportedCapability(format!(
            "model {id} does not accept images"
        )));
    }
    Ok(())
}

// ─────────────────────────────────────────────
// Model handle
// ─────────────────────────────────────────────

/// One model, resolved on first use.
///
/// Built by [`Dispatcher::model`]. The id (or the default model, when none
/// was given) is resolved on the first call and reused afterwards.
#[derive(Debug)]
pub struct Model {
    dispatcher: Dispatcher,
    requested: Option<String>,
    resolved: OnceCell<String>,
}

impl Model {
    /// Canonical id, resolving it if this is the first call.
    pub async fn id(&self) -> Result<&str> {
        self.resolved
            .get_or_try_init(|| async {
                let requested = self.dispatcher.requested_id(self.requested.as_deref())?;
                self.dispatcher
                    .resolve_provider_and_model(&requested)
                    .map(|r| r.id)
            })
            .await
            .map(String::as_str)
    }

    pub async fn answer(&self, prompt: &str, options: &AnswerOptions) -> Result<AnswerResult> {
        let id = self.id().await?;
        self.dispatcher.answer(Some(id), prompt, options).await
    }

    pub async fn completion(&self, prompt: &str, options: &AnswerOptions) -> Result<String> {
        Ok(self.answer(prompt, options).await?.output)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
