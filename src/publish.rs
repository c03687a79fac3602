// Artwork publication: pin the image, build a metadata document that
// points at it, pin that document, and report both identifiers.
//
// `Publisher::publish` never returns an error. Every failure is folded
// into a `PublicationResult::Failed` at the outer boundary.
//
// Two publications of images with the same file name share the transient
// metadata file path and can race on it. No locking is done.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::error::{ErrorKind, PublishError};
use crate::metadata::{FieldMapping, MetadataDocument};
use crate::pinata::{gateway_url, ipfs_uri, ContentId, PinningGateway};

pub const IMAGE_PIN_PREFIX: &str = "museum_artwork_";
pub const METADATA_PIN_PREFIX: &str = "metadata_";

/// Both identifiers of a completed publication plus ready-to-use links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub image_cid: ContentId,
    pub metadata_cid: ContentId,
    pub metadata_url: String,
    pub gateway_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicationResult {
    Published(Publication),
    Failed { kind: ErrorKind, error: String },
}

impl PublicationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, PublicationResult::Published(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            PublicationResult::Failed { error, .. } => Some(error.as_str()),
            PublicationResult::Published(_) => None,
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            PublicationResult::Failed { kind, .. } => Some(*kind),
            PublicationResult::Published(_) => None,
        }
    }
}

impl From<PublishError> for PublicationResult {
    fn from(err: PublishError) -> Self {
        PublicationResult::Failed {
            kind: err.kind(),
            error: err.to_string(),
        }
    }
}

// Flat `{success, ...}` object, the shape callers of the upload helper
// have always consumed.
impl Serialize for PublicationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PublicationResult::Published(p) => {
                let mut s = serializer.serialize_struct("PublicationResult", 5)?;
                s.serialize_field("success", &true)?;
                s.serialize_field("image_cid", p.image_cid.as_str())?;
                s.serialize_field("metadata_cid", p.metadata_cid.as_str())?;
                s.serialize_field("metadata_url", &p.metadata_url)?;
                s.serialize_field("gateway_url", &p.gateway_url)?;
                s.end()
            }
            PublicationResult::Failed { error, .. } => {
                let mut s = serializer.serialize_struct("PublicationResult", 2)?;
                s.serialize_field("success", &false)?;
                s.serialize_field("error", error)?;
                s.end()
            }
        }
    }
}

/// A file that exists for as long as the guard lives. Dropping the guard
/// removes it; a failed removal is logged and otherwise ignored.
#[derive(Debug)]
pub struct TransientFile {
    path: PathBuf,
}

impl TransientFile {
    pub fn create(path: PathBuf, contents: &[u8]) -> io::Result<Self> {
        Self::create_with(path, |file| file.write_all(contents))
    }

    /// Create the file and fill it through `write`. The guard owns the
    /// file from the moment it exists, so a failed write still removes it.
    pub fn create_with<F>(path: PathBuf, write: F) -> io::Result<Self>
    where
        F: FnOnce(&mut File) -> io::Result<()>,
    {
        let mut file = File::create(&path)?;
        let guard = TransientFile { path };
        write(&mut file)?;
        file.flush()?;
        tracing::debug!("Created temporary file at {}", guard.path.display());
        Ok(guard)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TransientFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!("Could not delete temp file {}: {}", self.path.display(), e);
        }
    }
}

/// Runs the publication pipeline against any `PinningGateway`.
pub struct Publisher<G> {
    gateway: G,
    temp_dir: PathBuf,
}

impl<G: PinningGateway> Publisher<G> {
    /// `temp_dir` holds the metadata document while it is being pinned.
    pub fn new(gateway: G, temp_dir: impl Into<PathBuf>) -> Self {
        Publisher {
            gateway,
            temp_dir: temp_dir.into(),
        }
    }

    /// Where the metadata document for `image_path` is staged.
    pub fn metadata_temp_path(&self, image_path: &Path) -> PathBuf {
        self.temp_dir
            .join(format!("{}{}.json", METADATA_PIN_PREFIX, base_name(image_path)))
    }

    pub fn publish(&self, image_path: &Path, fields: &FieldMapping) -> PublicationResult {
        tracing::info!("Uploading artwork from {} to IPFS", image_path.display());
        match self.try_publish(image_path, fields) {
            Ok(publication) => PublicationResult::Published(publication),
            Err(err) => {
                tracing::error!("Artwork publication failed ({}): {}", err.kind().as_str(), err);
                err.into()
            }
        }
    }

    fn try_publish(&self, image_path: &Path, fields: &FieldMapping) -> Result<Publication, PublishError> {
        if !image_path.exists() {
            return Err(PublishError::FileNotFound(image_path.to_path_buf()));
        }
        let base = base_name(image_path);

        let image_cid = self
            .gateway
            .pin_file(image_path, &format!("{}{}", IMAGE_PIN_PREFIX, base))?
            .ok_or(PublishError::ImageUploadFailed)?;
        tracing::info!("Image uploaded successfully. CID: {}", image_cid);

        let document = MetadataDocument::new(fields, &image_cid);
        let metadata_cid = self.pin_metadata(&document, image_path, &base)?;
        tracing::info!("Metadata uploaded successfully. CID: {}", metadata_cid);

        Ok(Publication {
            metadata_url: ipfs_uri(&metadata_cid),
            gateway_url: gateway_url(&metadata_cid),
            image_cid,
            metadata_cid,
        })
    }

    fn pin_metadata(
        &self,
        document: &MetadataDocument,
        image_path: &Path,
        base: &str,
    ) -> Result<ContentId, PublishError> {
        let staged = TransientFile::create(
            self.metadata_temp_path(image_path),
            &document.to_json_bytes()?,
        )?;
        let pinned = self
            .gateway
            .pin_file(staged.path(), &format!("{}{}", METADATA_PIN_PREFIX, base));
        drop(staged);
        pinned?.ok_or(PublishError::MetadataUploadFailed)
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    struct PinCall {
        name: String,
        existed: bool,
        contents: Vec<u8>,
        path: PathBuf,
    }

    /// Hands out queued answers in order and records every call.
    #[derive(Default)]
    struct FakeGateway {
        answers: Mutex<VecDeque<Result<Option<ContentId>, PublishError>>>,
        calls: Mutex<Vec<PinCall>>,
    }

    impl FakeGateway {
        fn answering(answers: Vec<Result<Option<&str>, PublishError>>) -> Self {
            let answers = answers
                .into_iter()
                .map(|a| a.map(|cid| cid.and_then(|c| ContentId::new(c))))
                .collect();
            FakeGateway {
                answers: Mutex::new(answers),
                calls: Mutex::default(),
            }
        }

        fn calls(&self) -> Vec<PinCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl PinningGateway for FakeGateway {
        fn pin_file(&self, path: &Path, name: &str) -> Result<Option<ContentId>, PublishError> {
            self.calls.lock().unwrap().push(PinCall {
                name: name.to_string(),
                existed: path.exists(),
                contents: fs::read(path).unwrap_or_default(),
                path: path.to_path_buf(),
            });
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(None))
        }
    }

    fn artwork(dir: &Path) -> PathBuf {
        let path = dir.join("art.png");
        fs::write(&path, b"\x89PNG\r\n\x1a\nfake").unwrap();
        path
    }

    #[test]
    fn missing_file_fails_without_pinning() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = FakeGateway::answering(vec![Ok(Some("Qm111"))]);
        let publisher = Publisher::new(&gateway, dir.path());
        let missing = dir.path().join("nope.png");

        let result = publisher.publish(&missing, &FieldMapping::default());
        assert_eq!(result.kind(), Some(ErrorKind::FileNotFound));
        assert!(result.error().unwrap().starts_with("File not found"));
        assert!(gateway.calls().is_empty());
    }

    #[test]
    fn full_success_reports_both_cids() {
        let dir = tempfile::tempdir().unwrap();
        let image = artwork(dir.path());
        let gateway = FakeGateway::answering(vec![Ok(Some("Qm111")), Ok(Some("Qm222"))]);
        let publisher = Publisher::new(&gateway, dir.path());
        let fields: FieldMapping = [("title", "Sunrise")].into_iter().collect();

        let result = publisher.publish(&image, &fields);
        let expected = Publication {
            image_cid: ContentId::new("Qm111").unwrap(),
            metadata_cid: ContentId::new("Qm222").unwrap(),
            metadata_url: "ipfs://Qm222".into(),
            gateway_url: "https://gateway.pinata.cloud/ipfs/Qm222".into(),
        };
        assert_eq!(result, PublicationResult::Published(expected));

        let calls = gateway.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].name, "museum_artwork_art.png");
        assert_eq!(calls[0].path, image);
        assert_eq!(calls[1].name, "metadata_art.png");
        assert!(calls[1].existed);
        assert_eq!(calls[1].path, dir.path().join("metadata_art.png.json"));

        let doc: MetadataDocument = serde_json::from_slice(&calls[1].contents).unwrap();
        assert_eq!(doc.name, "Sunrise");
        assert_eq!(doc.image, "ipfs://Qm111");

        assert!(!publisher.metadata_temp_path(&image).exists());
    }

    #[test]
    fn defaults_flow_into_the_pinned_document() {
        let dir = tempfile::tempdir().unwrap();
        let image = artwork(dir.path());
        let gateway = FakeGateway::answering(vec![Ok(Some("Qm111")), Ok(Some("Qm222"))]);
        let publisher = Publisher::new(&gateway, dir.path());

        assert!(publisher.publish(&image, &FieldMapping::default()).is_success());
        let doc: MetadataDocument = serde_json::from_slice(&gateway.calls()[1].contents).unwrap();
        assert_eq!(doc.name, "Untitled Artwork");
        assert_eq!(doc.attribute("Creator"), Some("Unknown"));
    }

    #[test]
    fn failed_image_pin_skips_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let image = artwork(dir.path());
        let gateway = FakeGateway::answering(vec![Ok(None), Ok(Some("Qm222"))]);
        let publisher = Publisher::new(&gateway, dir.path());

        let result = publisher.publish(&image, &FieldMapping::default());
        assert_eq!(result.error(), Some("Failed to upload image to IPFS"));
        assert_eq!(result.kind(), Some(ErrorKind::UploadFailed));
        assert_eq!(gateway.calls().len(), 1);
        assert!(!publisher.metadata_temp_path(&image).exists());
    }

    #[test]
    fn failed_metadata_pin_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let image = artwork(dir.path());
        let gateway = FakeGateway::answering(vec![Ok(Some("Qm111")), Ok(None)]);
        let publisher = Publisher::new(&gateway, dir.path());

        let result = publisher.publish(&image, &FieldMapping::default());
        assert_eq!(result.error(), Some("Failed to upload metadata to IPFS"));
        assert!(!publisher.metadata_temp_path(&image).exists());
    }

    #[test]
    fn gateway_fault_during_metadata_still_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let image = artwork(dir.path());
        let gateway = FakeGateway::answering(vec![
            Ok(Some("Qm111")),
            Err(PublishError::MalformedResponse("not json".into())),
        ]);
        let publisher = Publisher::new(&gateway, dir.path());

        let result = publisher.publish(&image, &FieldMapping::default());
        assert_eq!(result.kind(), Some(ErrorKind::UnexpectedFault));
        assert!(result.error().unwrap().contains("not json"));
        assert!(!publisher.metadata_temp_path(&image).exists());
    }

    #[test]
    fn missing_credentials_surface_as_their_own_kind() {
        let dir = tempfile::tempdir().unwrap();
        let image = artwork(dir.path());
        let gateway = FakeGateway::answering(vec![Err(PublishError::MissingCredentials)]);
        let publisher = Publisher::new(&gateway, dir.path());

        let result = publisher.publish(&image, &FieldMapping::default());
        assert_eq!(result.kind(), Some(ErrorKind::MissingCredentials));
        assert_eq!(gateway.calls().len(), 1);
    }

    #[test]
    fn unwritable_temp_dir_is_an_unexpected_fault() {
        let dir = tempfile::tempdir().unwrap();
        let image = artwork(dir.path());
        let gateway = FakeGateway::answering(vec![Ok(Some("Qm111")), Ok(Some("Qm222"))]);
        let publisher = Publisher::new(&gateway, dir.path().join("no/such/dir"));

        let result = publisher.publish(&image, &FieldMapping::default());
        assert_eq!(result.kind(), Some(ErrorKind::UnexpectedFault));
        assert_eq!(gateway.calls().len(), 1);
    }

    #[test]
    fn transient_file_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scratch.json");
        {
            let staged = TransientFile::create(path.clone(), b"{}").unwrap();
            assert!(staged.path().exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn transient_file_is_removed_when_the_write_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata_art.png.json");
        let err = TransientFile::create_with(path.clone(), |file| {
            file.write_all(b"{\"name\": \"Sun")?;
            Err(io::Error::new(io::ErrorKind::Other, "no space left on device"))
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "no space left on device");
        assert!(!path.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn transient_file_tolerates_early_removal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scratch.json");
        let staged = TransientFile::create(path.clone(), b"{}").unwrap();
        fs::remove_file(&path).unwrap();
        drop(staged);
        assert!(!path.exists());
    }

    #[test]
    fn result_serializes_to_flat_object() {
        let ok = PublicationResult::Published(Publication {
            image_cid: ContentId::new("Qm111").unwrap(),
            metadata_cid: ContentId::new("Qm222").unwrap(),
            metadata_url: "ipfs://Qm222".into(),
            gateway_url: "https://gateway.pinata.cloud/ipfs/Qm222".into(),
        });
        let value = serde_json::to_value(&ok).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["image_cid"], "Qm111");
        assert_eq!(value["metadata_url"], "ipfs://Qm222");

        let failed: PublicationResult = PublishError::ImageUploadFailed.into();
        let value = serde_json::to_value(&failed).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"success": false, "error": "Failed to upload image to IPFS"})
        );
    }
}
