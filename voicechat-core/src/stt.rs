// Wire constants for the speech-to-text upload.

pub const STT_PATH: &str = "/stt";
pub const STT_FORM_FIELD: &str = "audio";

// The server expects these regardless of what the recorder actually produced.
pub const STT_UPLOAD_FILENAME: &str = "audioRecording.m4a";
pub const STT_UPLOAD_MIME: &str = "audio/m4a";

pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{}/{}", base, path)
}

pub fn stt_url(api_url: &str) -> String {
    join_url(api_url, STT_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_handles_trailing_slash() {
        assert_eq!(
            join_url("https://api.example.com/", "/stt"),
            "https://api.example.com/stt"
        );
        assert_eq!(
            join_url("https://api.example.com", "stt"),
            "https://api.example.com/stt"
        );
    }

    #[test]
    fn stt_url_appends_path() {
        assert_eq!(stt_url("http://10.0.2.2:8000"), "http://10.0.2.2:8000/stt");
        assert_eq!(stt_url("http://host/api/"), "http://host/api/stt");
    }
}
