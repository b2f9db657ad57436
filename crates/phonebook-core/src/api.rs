use std::path::Path;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{normalize_base_url, Config};
use crate::conversation::Request;
use crate::error::ApiError;
use crate::images::{mime_for_path, save_images};
use crate::mode::Mode;
use crate::payload::{Body, CompanyProfile, ImageBatch, NewsDigest, PersonProfile};

/// Header carrying the optional API token
pub const TOKEN_HEADER: &str = "x-api-key";

#[derive(Serialize)]
struct CompanyRequest<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct PersonRequest<'a> {
    linkedin_url: &'a str,
}

#[derive(Serialize)]
struct NewsRequest<'a> {
    topic: &'a str,
    mode: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    days: Option<u32>,
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    prompt: &'a str,
    n: u32,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ImageResult {
    data_url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ImageResponse {
    pub model: String,
    images: Vec<ImageResult>,
}

impl ImageResponse {
    /// Non-empty data URLs in response order
    pub fn data_urls(&self) -> Vec<String> {
        self.images
            .iter()
            .filter_map(|i| i.data_url.clone())
            .filter(|u| !u.is_empty())
            .collect()
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// Client for the lookup API. Cheap to clone; clones share a connection pool.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        Self {
            client: Client::new(),
            base_url: normalize_base_url(base_url),
            token: token.filter(|t| !t.is_empty()).map(str::to_string),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.api_base(), config.api_token())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn company(&self, name: &str) -> Result<CompanyProfile, ApiError> {
        self.post_json(Mode::Company.endpoint(), &CompanyRequest { name }).await
    }

    pub async fn person(&self, linkedin_url: &str) -> Result<PersonProfile, ApiError> {
        self.post_json(Mode::Person.endpoint(), &PersonRequest { linkedin_url })
            .await
    }

    pub async fn news(&self, topic: &str, days: Option<u32>) -> Result<NewsDigest, ApiError> {
        let request = NewsRequest {
            topic,
            mode: "briefing",
            days,
        };
        self.post_json(Mode::News.endpoint(), &request).await
    }

    /// Feed for the dashboard: a 7-day briefing on `topic`.
    ///
    /// Some deployments wrap the digest as `{"solar_sg": {...}}`; that wrapper
    /// is removed.
    pub async fn dashboard(&self, topic: &str) -> Result<NewsDigest, ApiError> {
        let request = NewsRequest {
            topic,
            mode: "briefing",
            days: Some(7),
        };
        let mut value: serde_json::Value = self.post_json(Mode::News.endpoint(), &request).await?;
        let wrapped = value.get_mut("solar_sg").map(serde_json::Value::take);
        if let Some(inner) = wrapped {
            value = inner;
        }
        Ok(serde_json::from_value(value)?)
    }

    pub async fn generate_image(&self, prompt: &str, n: u32) -> Result<ImageResponse, ApiError> {
        self.post_json(Mode::Image.endpoint(), &ImageRequest { prompt, n })
            .await
    }

    /// Multipart upload of `image` with an edit prompt
    pub async fn edit_image(&self, prompt: &str, n: u32, image: &Path) -> Result<ImageResponse, ApiError> {
        let bytes = tokio::fs::read(image)
            .await
            .map_err(|e| ApiError::io(format!("reading {}", image.display()), e))?;
        let file_name = image
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime_for_path(image))?;
        let form = Form::new()
            .text("prompt", prompt.to_string())
            .text("n", n.to_string())
            .part("image", part);

        let response = self.post("/image/edit").multipart(form).send().await?;
        Self::read_json(response).await
    }

    /// Run a conversation request against the endpoint its mode selects.
    ///
    /// Studio results are decoded and written to `output_dir`; the returned
    /// body lists the saved files.
    pub async fn execute(&self, request: &Request, output_dir: &Path) -> Result<Body, ApiError> {
        debug!(mode = request.mode.as_str(), "sending request");
        let body = match request.mode {
            Mode::Company => Body::Company(self.company(&request.prompt).await?),
            Mode::Person => Body::Person(self.person(&request.prompt).await?),
            Mode::News => Body::News(self.news(&request.prompt, None).await?),
            Mode::Image => {
                let response = match &request.attachment {
                    Some(path) => self.edit_image(&request.prompt, 1, path).await?,
                    None => self.generate_image(&request.prompt, 1).await?,
                };
                let files = save_images(&response.data_urls(), output_dir).await?;
                Body::Images(ImageBatch {
                    model: response.model,
                    files,
                })
            }
        };
        Ok(body)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.post(url);
        match &self.token {
            Some(token) => builder.header(TOKEN_HEADER, token),
            None => builder,
        }
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.post(path).json(body).send().await?;
        Self::read_json(response).await
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|b| b.detail)
                .map(|d| match d {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                });
            warn!(status = status.as_u16(), "API request failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}
