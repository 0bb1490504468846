use futures_util::{pin_mut, Stream, StreamExt};
use url::Url;

use super::entities::BustimeResponse;
use super::error::{BustimeError, BustimeResult};
use crate::config::Config;

#[derive(Clone)]
pub struct BustimeClient {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
    stop_id: String,
    prediction_count: u32,
    max_body_bytes: usize,
}

impl BustimeClient {
    pub fn new(config: &Config) -> BustimeResult<BustimeClient> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(BustimeClient {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            stop_id: config.stop_id.clone(),
            prediction_count: config.prediction_count,
            max_body_bytes: config.max_body_bytes,
        })
    }

    fn predictions_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("key", &self.api_key)
            .append_pair("stpid", &self.stop_id)
            .append_pair("top", &self.prediction_count.to_string())
            .append_pair("tmres", "s")
            .append_pair("format", "json");
        url
    }

    async fn request<T>(&self, url: Url) -> BustimeResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        log::debug!("Requesting {}", redact_key(&url));
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BustimeError::Status(status.as_u16()));
        }

        let declared = response.content_length();
        if let Some(length) = declared {
            if length > self.max_body_bytes as u64 {
                return Err(BustimeError::BodyTooLarge {
                    limit: self.max_body_bytes,
                });
            }
        }

        let body = read_capped(response.bytes_stream(), self.max_body_bytes, declared).await?;
        log::trace!("Response: {}", String::from_utf8_lossy(&body));
        let data = serde_json::from_slice(&body)?;

        Ok(data)
    }

    pub async fn get_predictions(&self) -> BustimeResult<BustimeResponse> {
        self.request(self.predictions_url()).await
    }
}

/// Collects a body stream, giving up as soon as it would grow past `limit` bytes.
/// The buffer's allocation never exceeds `limit` either.
pub(crate) async fn read_capped<S, B, E>(
    stream: S,
    limit: usize,
    size_hint: Option<u64>,
) -> BustimeResult<Vec<u8>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    BustimeError: From<E>,
{
    pin_mut!(stream);

    let initial = size_hint.map_or(0, |hint| hint.min(limit as u64) as usize);
    let mut body = Vec::with_capacity(initial);
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        let chunk = chunk.as_ref();
        let needed = body.len() + chunk.len();
        if needed > limit {
            return Err(BustimeError::BodyTooLarge { limit });
        }
        if needed > body.capacity() {
            // double like Vec would, but clamped to the cap
            let target = body.capacity().saturating_mul(2).max(needed).min(limit);
            body.reserve_exact(target - body.len());
        }
        body.extend_from_slice(chunk);
    }

    Ok(body)
}

fn redact_key(url: &Url) -> Url {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "key" { "***".into() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();

    let mut redacted = url.clone();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted
}
