/// Infers a media type for a path before it is written.
pub trait MimeGuesser: Send + Sync {
    fn guess(&self, path: &str) -> String;
}

/// Guesses from the file extension, falling back to `application/octet-stream`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionGuesser;

impl MimeGuesser for ExtensionGuesser {
    fn guess(&self, path: &str) -> String {
        mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    }
}
