use serde::{Deserialize, Serialize};

/// One row of the condition list: an image and the degradation applied to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialDescriptor {
    #[serde(rename = "Image")]
    pub image: String,
    // The study files spell the column "Degredation".
    #[serde(rename = "Degredation", alias = "Degradation")]
    pub degradation: String,
}

impl TrialDescriptor {
    pub fn new(image: impl Into<String>, degradation: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            degradation: degradation.into(),
        }
    }
}
