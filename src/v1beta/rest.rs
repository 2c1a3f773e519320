use super::embedding::{
    BatchEmbedContentsResponse, EmbedContentRequest, EmbedContentResponse, Embedding,
};
use super::response::{ModelInfo, ModelPage, Response, TokenCount};
use super::sse::parse_sse_stream;
use super::{API_BASE, Content, ContentGenerator, ContentStream, Error, TransportError, request};
use async_trait::async_trait;
use derive_new::new;
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;
use tracing::{debug, warn};
use url::Url;

/// Error body returned by the API, both as a non-2xx payload and as an
/// in-band event on an open stream.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl ApiErrorDetail {
    fn into_transport_error(self, fallback_status: u16) -> TransportError {
        let status = if self.code == 0 { fallback_status } else { self.code };
        let message = match self.status {
            Some(kind) => format!("{kind}: {}", self.message),
            None => self.message,
        };
        TransportError::Api { status, message }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StreamEvent {
    Failure(ApiErrorBody),
    Chunk(Response),
}

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Reported as the model of errors from calls that address no single model.
const MODEL_COLLECTION: &str = "models";

const LIST_PAGE_SIZE: u32 = 100;

#[derive(Serialize)]
struct CountTokensBody<'a> {
    contents: &'a [Content],
}

#[derive(Serialize)]
struct BatchEmbedBody<'a> {
    requests: &'a [EmbedContentRequest],
}

/// HTTP client for the `v1beta` model endpoints.
#[derive(Clone, new, Setters)]
#[setters(prefix = "with_", into, strip_option)]
pub struct Client {
    #[setters(skip)]
    #[new(into)]
    api_key: String,
    #[new(value = "API_BASE.to_string()")]
    api_base: String,
    #[new(value = "reqwest::Client::new()")]
    client: reqwest::Client,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl Client {
    /// URLs never carry the key; it is sent in the `x-goog-api-key` header.
    fn endpoint(&self, model: &str, method: Option<&str>, sse: bool) -> Result<Url, TransportError> {
        let model = model.strip_prefix("models/").unwrap_or(model);
        let path = match method {
            Some(method) => format!("{}/{model}:{method}", self.api_base),
            None => format!("{}/{model}", self.api_base),
        };
        let mut url = Url::parse(&path)?;
        if sse {
            url.query_pairs_mut().append_pair("alt", "sse");
        }
        Ok(url)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header(reqwest::header::USER_AGENT, env!("CARGO_CRATE_NAME"))
            .header(API_KEY_HEADER, &self.api_key)
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<reqwest::Response, TransportError> {
        let response = self
            .authorized(self.client.post(url))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await?;
        check_status(response).await
    }

    async fn get(&self, url: Url) -> Result<reqwest::Response, TransportError> {
        let response = self.authorized(self.client.get(url)).send().await?;
        check_status(response).await
    }

    #[tracing::instrument(skip(self, request), fields(model = %request.model()))]
    pub async fn generate_content(&self, request: request::Request) -> Result<Response, Error> {
        let call = async {
            let url = self.endpoint(request.model(), Some("generateContent"), false)?;
            let response = self.post(url, &request).await?;
            Ok::<_, TransportError>(response.json::<Response>().await?)
        };
        call.await.map_err(|source| Error::Call {
            model: request.model().to_string(),
            source,
        })
    }

    /// Open a server-sent-events stream. Failures before the first byte of the
    /// body are [`Error::Call`]; everything after surfaces through the stream
    /// as [`Error::Stream`].
    #[tracing::instrument(skip(self, request), fields(model = %request.model()))]
    pub async fn stream_content(&self, request: request::Request) -> Result<ContentStream, Error> {
        let call = async {
            let url = self.endpoint(request.model(), Some("streamGenerateContent"), true)?;
            self.post(url, &request).await
        };
        let response = call.await.map_err(|source| Error::Call {
            model: request.model().to_string(),
            source,
        })?;

        let status = response.status().as_u16();
        let chunks = parse_sse_stream::<StreamEvent, _>(response.bytes_stream()).map(move |event| {
            match event? {
                StreamEvent::Chunk(chunk) => Ok(chunk),
                StreamEvent::Failure(body) => {
                    let error = body.error.into_transport_error(status);
                    warn!(%error, "error event on stream");
                    Err(error)
                }
            }
        });
        Ok(ContentStream::new(request.model(), chunks))
    }

    #[tracing::instrument(skip(self, contents), fields(contents = contents.len()))]
    pub async fn count_tokens(&self, model: &str, contents: &[Content]) -> Result<TokenCount, Error> {
        let call = async {
            let url = self.endpoint(model, Some("countTokens"), false)?;
            let response = self.post(url, &CountTokensBody { contents }).await?;
            Ok::<_, TransportError>(response.json::<TokenCount>().await?)
        };
        call.await.map_err(|source| Error::Call {
            model: model.to_string(),
            source,
        })
    }

    /// Metadata of a model, including its input and output token limits.
    #[tracing::instrument(skip(self))]
    pub async fn get_model(&self, model: &str) -> Result<ModelInfo, Error> {
        let call = async {
            let url = self.endpoint(model, None, false)?;
            Ok::<_, TransportError>(self.get(url).await?.json::<ModelInfo>().await?)
        };
        call.await.map_err(|source| Error::Call {
            model: model.to_string(),
            source,
        })
    }

    /// One page of the models available to the key. Pass the previous page's
    /// `next_page_token` to continue.
    #[tracing::instrument(skip(self))]
    pub async fn list_models(
        &self,
        page_size: Option<u32>,
        page_token: Option<&str>,
    ) -> Result<ModelPage, Error> {
        let call = async {
            let mut url = Url::parse(&self.api_base)?;
            {
                let mut query = url.query_pairs_mut();
                if let Some(size) = page_size {
                    query.append_pair("pageSize", &size.to_string());
                }
                if let Some(token) = page_token {
                    query.append_pair("pageToken", token);
                }
            }
            if url.query() == Some("") {
                url.set_query(None);
            }
            Ok::<_, TransportError>(self.get(url).await?.json::<ModelPage>().await?)
        };
        call.await.map_err(|source| Error::Call {
            model: MODEL_COLLECTION.to_string(),
            source,
        })
    }

    /// Every model available to the key, following page tokens to the end.
    pub async fn list_all_models(&self) -> Result<Vec<ModelInfo>, Error> {
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self
                .list_models(Some(LIST_PAGE_SIZE), page_token.as_deref())
                .await?;
            models.extend(page.models);
            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        debug!(models = models.len(), "models listed");
        Ok(models)
    }

    #[tracing::instrument(skip(self, request), fields(model = %request.model()))]
    pub async fn embed_content(&self, request: &EmbedContentRequest) -> Result<Embedding, Error> {
        let call = async {
            let url = self.endpoint(request.model(), Some("embedContent"), false)?;
            let response = self.post(url, request).await?;
            Ok::<_, TransportError>(response.json::<EmbedContentResponse>().await?.embedding)
        };
        call.await.map_err(|source| Error::Call {
            model: request.model().to_string(),
            source,
        })
    }

    /// Embed several contents in one call. Embeddings come back in request order.
    #[tracing::instrument(skip(self, requests), fields(requests = requests.len()))]
    pub async fn batch_embed_contents(
        &self,
        model: &str,
        requests: &[EmbedContentRequest],
    ) -> Result<Vec<Embedding>, Error> {
        let call = async {
            let url = self.endpoint(model, Some("batchEmbedContents"), false)?;
            let response = self.post(url, &BatchEmbedBody { requests }).await?;
            Ok::<_, TransportError>(response.json::<BatchEmbedContentsResponse>().await?.embeddings)
        };
        call.await.map_err(|source| Error::Call {
            model: model.to_string(),
            source,
        })
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|e| format!("Failed to read error body: {}", e));
    let error = match serde_json::from_str::<ApiErrorBody>(&body) {
        Ok(parsed) => parsed.error.into_transport_error(status.as_u16()),
        Err(_) => TransportError::Api {
            status: status.as_u16(),
            message: body,
        },
    };
    warn!(%error, "request rejected");
    Err(error)
}

#[async_trait]
impl ContentGenerator for Client {
    async fn generate_content(&self, request: request::Request) -> Result<Response, Error> {
        Client::generate_content(self, request).await
    }

    async fn stream_content(&self, request: request::Request) -> Result<ContentStream, Error> {
        Client::stream_content(self, request).await
    }
}
