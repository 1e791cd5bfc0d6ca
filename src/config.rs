use std::{env, str::FromStr, time::Duration};
use tracing::warn;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 20;
const DEFAULT_PAGE_SIZE: usize = 8;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub request_max_bytes: usize,
    pub http: HttpSettings,
    pub providers: ProviderSettings,
    pub shopify: ShopifySettings,
    pub products_page_size: usize,
    pub api_keys: Option<String>,
    pub openapi_key: Option<String>,
    pub metrics_key: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub order: Vec<ProviderKind>,
    pub call_timeout: Duration,
    pub groq: ChatProviderSettings,
    pub mistral: ChatProviderSettings,
    pub tensorzero: TensorZeroSettings,
}

#[derive(Debug, Clone)]
pub struct ChatProviderSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct TensorZeroSettings {
    pub gateway_url: Option<String>,
    pub api_key: Option<String>,
    pub function_name: String,
    pub model: Option<String>,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct ShopifySettings {
    pub store_url: Option<String>,
    pub access_token: Option<String>,
    pub api_version: String,
}

impl ShopifySettings {
    /// Admin GraphQL endpoint for the configured store, if any.
    ///
    /// The store may be given with or without a scheme or trailing slash;
    /// the endpoint is always served over https.
    pub fn endpoint(&self) -> Option<String> {
        let store = self.store_url.as_deref()?;
        let host = store
            .trim()
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');
        if host.is_empty() {
            return None;
        }
        Some(format!(
            "https://{host}/admin/api/{}/graphql.json",
            self.api_version
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Groq,
    Mistral,
    TensorZero,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Groq => "groq",
            ProviderKind::Mistral => "mistral",
            ProviderKind::TensorZero => "tensorzero",
        }
    }

    pub fn from_str(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "groq" => Some(ProviderKind::Groq),
            "mistral" => Some(ProviderKind::Mistral),
            "tensorzero" | "tensor_zero" => Some(ProviderKind::TensorZero),
            _ => None,
        }
    }

    pub fn default_order() -> Vec<Self> {
        vec![
            ProviderKind::Groq,
            ProviderKind::Mistral,
            ProviderKind::TensorZero,
        ]
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = EnvReader { lookup };
        Self {
            port: vars.parse("PORT").unwrap_or(DEFAULT_PORT),
            request_max_bytes: vars
                .parse::<usize>("REQUEST_MAX_BYTES")
                .filter(|v| *v > 0)
                .unwrap_or(64 * 1024),
            http: HttpSettings {
                timeout: Duration::from_secs(vars.parse("HTTP_TIMEOUT_SECS").unwrap_or(30)),
                connect_timeout: Duration::from_secs(
                    vars.parse("HTTP_CONNECT_TIMEOUT_SECS").unwrap_or(5),
                ),
            },
            providers: ProviderSettings {
                order: vars
                    .string("PROVIDER_ORDER")
                    .map(|raw| parse_provider_order(&raw))
                    .filter(|order| !order.is_empty())
                    .unwrap_or_else(ProviderKind::default_order),
                call_timeout: Duration::from_secs(
                    vars.parse::<u64>("PROVIDER_TIMEOUT_SECS")
                        .filter(|v| *v > 0)
                        .unwrap_or(DEFAULT_PROVIDER_TIMEOUT_SECS),
                ),
                groq: ChatProviderSettings {
                    api_key: vars.string("GROQ_API_KEY"),
                    model: vars
                        .string("GROQ_MODEL")
                        .unwrap_or_else(|| "llama-3.3-70b-versatile".into()),
                    base_url: vars
                        .string("GROQ_BASE_URL")
                        .unwrap_or_else(|| "https://api.groq.com/openai/v1".into()),
                    timeout: vars.secs("GROQ_TIMEOUT_SECS"),
                },
                mistral: ChatProviderSettings {
                    api_key: vars.string("MISTRAL_API_KEY"),
                    model: vars
                        .string("MISTRAL_MODEL")
                        .unwrap_or_else(|| "mistral-small-latest".into()),
                    base_url: vars
                        .string("MISTRAL_BASE_URL")
                        .unwrap_or_else(|| "https://api.mistral.ai/v1".into()),
                    timeout: vars.secs("MISTRAL_TIMEOUT_SECS"),
                },
                tensorzero: TensorZeroSettings {
                    gateway_url: vars.string("TENSORZERO_GATEWAY_URL"),
                    api_key: vars.string("TENSORZERO_API_KEY"),
                    function_name: vars
                        .string("TENSORZERO_FUNCTION")
                        .unwrap_or_else(|| "product_copy".into()),
                    model: vars.string("TENSORZERO_MODEL"),
                    timeout: vars.secs("TENSORZERO_TIMEOUT_SECS"),
                },
            },
            shopify: ShopifySettings {
                store_url: vars.string("SHOPIFY_STORE_URL"),
                access_token: vars.string("SHOPIFY_ACCESS_TOKEN"),
                api_version: vars
                    .string("SHOPIFY_API_VERSION")
                    .unwrap_or_else(|| "2026-01".into()),
            },
            products_page_size: vars
                .parse::<usize>("PRODUCTS_PAGE_SIZE")
                .filter(|v| (1..=250).contains(v))
                .unwrap_or(DEFAULT_PAGE_SIZE),
            api_keys: vars.string("OPTIMIZER_API_KEYS"),
            openapi_key: vars.string("OPENAPI_KEY"),
            metrics_key: vars.string("METRICS_KEY"),
        }
    }
}

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Blank values are treated as unset.
    fn string(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn parse<T: FromStr>(&self, key: &str) -> Option<T> {
        let raw = self.string(key)?;
        match raw.parse::<T>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(target = "optimizer.config", key, value = %raw, "ignored unparsable env value");
                None
            }
        }
    }

    fn secs(&self, key: &str) -> Option<Duration> {
        self.parse::<u64>(key)
            .filter(|v| *v > 0)
            .map(Duration::from_secs)
    }
}

fn parse_provider_order(raw: &str) -> Vec<ProviderKind> {
    let mut order = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match ProviderKind::from_str(entry) {
            Some(kind) if !order.contains(&kind) => order.push(kind),
            Some(_) => {}
            None => warn!(
                target = "optimizer.config",
                "ignored unknown PROVIDER_ORDER entry: {entry}"
            ),
        }
    }
    order
}
