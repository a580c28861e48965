use bytes::Bytes;

/// An image received on the upload endpoint, before it is stored.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    /// Client-supplied file name. Untrusted; sanitized before it touches the filesystem.
    pub file_name: String,
    /// Content type declared on the multipart part, if any.
    pub content_type: Option<String>,
    pub bytes: Bytes,
}
