use crate::request::{Body, HttpRequest, Method};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use voicechat_core::config::HttpSettings;

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}

/// Shared HTTP client. Built once so uploads reuse pooled connections.
#[derive(Debug, Clone)]
pub struct HttpRuntime {
    client: reqwest::Client,
}

impl HttpRuntime {
    pub fn new(settings: &HttpSettings) -> anyhow::Result<Self> {
        // Without an explicit timeout a broken endpoint would keep the
        // receiving flag up indefinitely.
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout())
            .timeout(settings.timeout())
            .build()
            .context("build http client")?;
        Ok(Self { client })
    }

    pub async fn execute(&self, req: &HttpRequest) -> anyhow::Result<HttpResponse> {
        let mut headers = HeaderMap::new();
        for (k, v) in &req.headers {
            let name = HeaderName::from_bytes(k.as_bytes())
                .with_context(|| format!("invalid header name: {k}"))?;
            let value = HeaderValue::from_str(v)
                .with_context(|| format!("invalid header value for {k}"))?;
            headers.insert(name, value);
        }

        let builder = match req.method {
            Method::Get => self.client.get(&req.url),
            Method::Post => self.client.post(&req.url),
        }
        .headers(headers);

        let builder = match &req.body {
            Body::Empty => builder,
            Body::Json(s) => builder.body(s.clone()),
            Body::Multipart { bytes, .. } => builder.body(bytes.clone()),
        };

        log::debug!("http request: {req:?}");
        let resp = builder.send().await.context("http request failed")?;
        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .await
            .context("failed reading response body")?
            .to_vec();

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn posts_body_and_returns_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/echo"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(201).set_body_string("ok"))
            .mount(&server)
            .await;

        let rt = HttpRuntime::new(&HttpSettings::default()).unwrap();
        let resp = rt
            .execute(&HttpRequest {
                method: Method::Post,
                url: format!("{}/echo", server.uri()),
                headers: vec![("Content-Type".into(), "application/json".into())],
                body: Body::Json("{}".into()),
            })
            .await
            .unwrap();

        assert_eq!(resp.status, 201);
        assert!(resp.is_success());
        assert_eq!(resp.body, b"ok");
    }

    #[tokio::test]
    async fn invalid_header_name_is_an_error() {
        let rt = HttpRuntime::new(&HttpSettings::default()).unwrap();
        let err = rt
            .execute(&HttpRequest {
                method: Method::Get,
                url: "http://127.0.0.1:9/".into(),
                headers: vec![("bad header".into(), "x".into())],
                body: Body::Empty,
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid header name"));
    }
}
