//! Typed report submissions.
//!
//! A [`ReportSubmission`] can only be built from valid input, so the
//! pipeline never hashes or uploads anything that would later be rejected.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;

use groundtruth_types::{GeoPoint, UserId, ValidationError};

/// Content type recorded when the client does not send one.
pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// A validated report submission.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportSubmission {
    title: String,
    creator_id: UserId,
    location: GeoPoint,
    file_bytes: Vec<u8>,
    file_name: String,
    mime_type: String,
}

impl ReportSubmission {
    pub fn new(
        title: impl Into<String>,
        creator_id: impl Into<String>,
        lat: f64,
        long: f64,
        file_bytes: Vec<u8>,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let title = non_blank(title.into(), "title")?;
        let creator_id =
            UserId::new(creator_id).map_err(|_| ValidationError::MissingField("creatorId"))?;
        let location = GeoPoint::new(lat, long)?;
        if file_bytes.is_empty() {
            return Err(ValidationError::MissingField("fileData"));
        }
        let file_name = non_blank(file_name.into(), "fileName")?;
        let mime_type = match mime_type.into().trim() {
            "" => DEFAULT_MIME_TYPE.to_string(),
            m => m.to_string(),
        };
        Ok(Self {
            title,
            creator_id,
            location,
            file_bytes,
            file_name,
            mime_type,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn creator_id(&self) -> &UserId {
        &self.creator_id
    }

    pub fn location(&self) -> GeoPoint {
        self.location
    }

    pub fn file_bytes(&self) -> &[u8] {
        &self.file_bytes
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

fn non_blank(value: String, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

/// A coordinate as clients actually send it: a JSON number or a numeric string.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum RawCoordinate {
    Number(f64),
    Text(String),
}

impl RawCoordinate {
    fn parse(&self, field: &'static str) -> Result<f64, ValidationError> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Text(s) => s.trim().parse().map_err(|_| ValidationError::InvalidNumber {
                field,
                value: s.clone(),
            }),
        }
    }
}

/// The JSON body of a report upload, before validation.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSubmission {
    pub title: Option<String>,
    pub creator_id: Option<String>,
    pub lat: Option<RawCoordinate>,
    pub long: Option<RawCoordinate>,
    /// Base64-encoded media bytes.
    pub file_data: Option<String>,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
}

impl RawSubmission {
    /// Decode and validate into a [`ReportSubmission`].
    pub fn validate(self) -> Result<ReportSubmission, ValidationError> {
        let title = self.title.ok_or(ValidationError::MissingField("title"))?;
        let creator_id = self
            .creator_id
            .ok_or(ValidationError::MissingField("creatorId"))?;
        let lat = self
            .lat
            .ok_or(ValidationError::MissingField("lat"))?
            .parse("lat")?;
        let long = self
            .long
            .ok_or(ValidationError::MissingField("long"))?
            .parse("long")?;
        let encoded = self
            .file_data
            .ok_or(ValidationError::MissingField("fileData"))?;
        let file_bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| ValidationError::InvalidFileData(e.to_string()))?;
        let file_name = self
            .file_name
            .ok_or(ValidationError::MissingField("fileName"))?;

        ReportSubmission::new(
            title,
            creator_id,
            lat,
            long,
            file_bytes,
            file_name,
            self.mime_type.unwrap_or_default(),
        )
    }
}
