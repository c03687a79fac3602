// Descriptive fields for an artwork and the metadata document that is
// pinned next to the image.

use serde::{Deserialize, Serialize};

use crate::pinata::{ipfs_uri, ContentId};

pub const DEFAULT_TITLE: &str = "Untitled Artwork";
pub const DEFAULT_CREATOR: &str = "Unknown";

/// Descriptive fields supplied by the caller. Every field is optional;
/// the accessor for each one documents the value used when it is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapping {
    pub title: Option<String>,
    pub description: Option<String>,
    pub creator: Option<String>,
    pub date_created: Option<String>,
    pub materials: Option<String>,
}

impl FieldMapping {
    /// Title, or `"Untitled Artwork"`.
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(DEFAULT_TITLE)
    }

    /// Description, or empty.
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    /// Creator, or `"Unknown"`.
    pub fn creator(&self) -> &str {
        self.creator.as_deref().unwrap_or(DEFAULT_CREATOR)
    }

    /// Creation date, or empty.
    pub fn date_created(&self) -> &str {
        self.date_created.as_deref().unwrap_or("")
    }

    /// Materials, or empty.
    pub fn materials(&self) -> &str {
        self.materials.as_deref().unwrap_or("")
    }
}

/// Accepts the loose key/value form (`title`, `description`, `creator`,
/// `dateCreated`, `materials`). Unknown keys are ignored.
impl<K, V> FromIterator<(K, V)> for FieldMapping
where
    K: AsRef<str>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = FieldMapping::default();
        for (key, value) in iter {
            let slot = match key.as_ref() {
                "title" => &mut fields.title,
                "description" => &mut fields.description,
                "creator" => &mut fields.creator,
                "dateCreated" | "date_created" => &mut fields.date_created,
                "materials" => &mut fields.materials,
                other => {
                    tracing::debug!("Ignoring unknown metadata field `{}`", other);
                    continue;
                }
            };
            *slot = Some(value.into());
        }
        fields
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub trait_type: String,
    pub value: String,
}

/// The document pinned as the artwork's metadata. Shape follows the
/// common NFT metadata layout: name, description, image URI, attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataDocument {
    pub name: String,
    pub description: String,
    pub image: String,
    pub attributes: Vec<Attribute>,
}

impl MetadataDocument {
    pub fn new(fields: &FieldMapping, image_cid: &ContentId) -> Self {
        let attribute = |trait_type: &str, value: &str| Attribute {
            trait_type: trait_type.to_string(),
            value: value.to_string(),
        };
        MetadataDocument {
            name: fields.title().to_string(),
            description: fields.description().to_string(),
            image: ipfs_uri(image_cid),
            attributes: vec![
                attribute("Creator", fields.creator()),
                attribute("Date Created", fields.date_created()),
                attribute("Materials", fields.materials()),
            ],
        }
    }

    pub fn attribute(&self, trait_type: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.trait_type == trait_type)
            .map(|a| a.value.as_str())
    }

    /// Pretty-printed JSON, two-space indent.
    pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }
}
