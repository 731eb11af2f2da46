use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Body,
}

impl std::fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Audio payloads are large; only summarize them.
        let body_summary = match &self.body {
            Body::Empty => "Empty".to_string(),
            Body::Json(s) => format!("Json(len={})", s.len()),
            Body::Multipart { boundary, bytes } => {
                format!("Multipart(boundary={}, bytes_len={})", boundary, bytes.len())
            }
        };

        f.debug_struct("HttpRequest")
            .field("method", &self.method.as_str())
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("body", &body_summary)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Body {
    Empty,
    Json(String),
    Multipart { boundary: String, bytes: Vec<u8> },
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = HttpRequest {
            method: Method::Get,
            url: "https://example.com".into(),
            headers: vec![("Content-Type".into(), "application/json".into())],
            body: Body::Empty,
        };
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("accept"), None);
    }

    #[test]
    fn debug_summarizes_multipart_body() {
        let req = HttpRequest {
            method: Method::Post,
            url: "https://example.com/stt".into(),
            headers: vec![],
            body: Body::Multipart {
                boundary: "b".into(),
                bytes: vec![0xAB; 4096],
            },
        };

        let s = format!("{req:?}");
        assert!(s.contains("POST"));
        assert!(s.contains("bytes_len=4096"));
        assert!(!s.contains("171"));
    }
}
