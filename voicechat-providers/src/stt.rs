use crate::request::{Body, HttpRequest, Method};
use voicechat_core::stt::{STT_FORM_FIELD, STT_UPLOAD_FILENAME, STT_UPLOAD_MIME, stt_url};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFile {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl AudioFile {
    /// Wraps recorded bytes with the name and type the STT endpoint expects.
    pub fn recording(bytes: Vec<u8>) -> Self {
        Self {
            filename: STT_UPLOAD_FILENAME.into(),
            mime_type: STT_UPLOAD_MIME.into(),
            bytes,
        }
    }
}

pub fn build_stt_request(api_url: &str, audio: &AudioFile) -> HttpRequest {
    let boundary = format!("Boundary-{}", uuid::Uuid::new_v4());

    let mut body: Vec<u8> = Vec::new();
    append_file(
        &mut body,
        &boundary,
        STT_FORM_FIELD,
        &audio.filename,
        &audio.mime_type,
        &audio.bytes,
    );
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

    HttpRequest {
        method: Method::Post,
        url: stt_url(api_url),
        headers: vec![
            (
                "Content-Type".into(),
                format!("multipart/form-data; boundary={}", boundary),
            ),
            ("Accept".into(), "application/json".into()),
        ],
        body: Body::Multipart {
            boundary,
            bytes: body,
        },
    }
}

fn append_file(
    body: &mut Vec<u8>,
    boundary: &str,
    name: &str,
    filename: &str,
    mime_type: &str,
    bytes: &[u8],
) {
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            name, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", mime_type).as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(b"\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_single_audio_part() {
        let audio = AudioFile::recording(vec![1, 2, 3]);
        let req = build_stt_request("http://api.local:8000/", &audio);

        assert_eq!(req.method, Method::Post);
        assert_eq!(req.url, "http://api.local:8000/stt");

        let Body::Multipart { boundary, bytes } = req.body.clone() else {
            panic!("expected multipart");
        };
        assert_eq!(
            req.header("content-type"),
            Some(format!("multipart/form-data; boundary={boundary}").as_str())
        );

        let s = String::from_utf8_lossy(&bytes);
        assert!(s.contains("name=\"audio\"; filename=\"audioRecording.m4a\""));
        assert!(s.contains("Content-Type: audio/m4a"));
        assert_eq!(s.matches("Content-Disposition").count(), 1);
        assert!(s.ends_with(&format!("--{boundary}--\r\n")));
    }

    #[test]
    fn payload_bytes_are_embedded_verbatim() {
        let payload = vec![0u8, 159, 146, 150, 255];
        let req = build_stt_request("http://h", &AudioFile::recording(payload.clone()));
        let Body::Multipart { bytes, .. } = req.body else {
            panic!("expected multipart");
        };
        assert!(bytes.windows(payload.len()).any(|w| w == payload.as_slice()));
    }
}
